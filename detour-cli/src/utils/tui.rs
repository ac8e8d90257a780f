use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(120);

/// Spinner shown on stderr while the day is fetched and travel is estimated.
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg:.dim}") {
        spinner.set_style(style.tick_chars("◐◓◑◒ "));
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(TICK);
    spinner
}
