//! Provider subprocess calls.
//!
//! Calendar and routing providers are external binaries
//! (e.g., `detour-calendar-google`, `detour-routing-kakao`) speaking JSON
//! over stdin/stdout. Any executable that speaks the protocol can be a
//! provider. Providers manage their own credentials; detour just passes the
//! provider-specific parameters from its config.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::constants::{CALENDAR_PROVIDER_PREFIX, PROVIDER_TIMEOUT, ROUTING_PROVIDER_PREFIX};
use crate::error::{DetourError, DetourResult};
use crate::protocol::{Command, ProviderCommand, Request, Response};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    binary_name: String,
}

impl Provider {
    pub fn calendar(name: &str) -> Self {
        Provider {
            binary_name: format!("{}{}", CALENDAR_PROVIDER_PREFIX, name),
        }
    }

    pub fn routing(name: &str) -> Self {
        Provider {
            binary_name: format!("{}{}", ROUTING_PROVIDER_PREFIX, name),
        }
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    fn binary_path(&self) -> DetourResult<std::path::PathBuf> {
        which::which(&self.binary_name)
            .map_err(|_| DetourError::ProviderNotInstalled(self.binary_name.clone()))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> DetourResult<C::Response> {
        self.call_with_timeout(cmd, PROVIDER_TIMEOUT).await
    }

    async fn call_with_timeout<C: ProviderCommand>(
        &self,
        cmd: C,
        budget: Duration,
    ) -> DetourResult<C::Response> {
        timeout(budget, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| DetourError::ProviderTimeout(budget.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> DetourResult<R> {
        let params = serde_json::to_value(params)?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)?;

        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DetourError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DetourError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(DetourError::Provider(format!(
                "{} exited with status: {}",
                self.binary_name,
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        parse_response(&response_str)
    }
}

fn parse_response<R: serde::de::DeserializeOwned>(raw: &str) -> DetourResult<R> {
    if raw.trim().is_empty() {
        return Err(DetourError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(raw.trim())
        .map_err(|e| DetourError::Provider(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(DetourError::Provider(error)),
    }
}
