use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDateTime};
use detour_core::calendar::{CalendarProvider, LocalStore};
use detour_core::config::DetourConfig;
use detour_core::cycle::Cycle;
use detour_core::reschedule::RescheduleFailure;
use detour_core::{EventOrigin, Recommendation, Rescheduler, TimedEvent, TravelMode};
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::render::Render;
use crate::utils::tui;

/// What to do when the recommendation is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Ask,
    Accept,
    NoApply,
}

pub struct CheckArgs {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub location: Option<String>,
    pub mode: Option<TravelMode>,
    pub events: Option<PathBuf>,
    pub calendar: bool,
    pub decision: Decision,
}

pub async fn run(args: CheckArgs) -> Result<()> {
    let config = DetourConfig::load().context("Could not load config")?;

    let start = parse_datetime(&args.start)?;
    let end = resolve_end(start, args.end.as_deref(), args.duration.as_deref())?;
    let origin = if args.calendar {
        EventOrigin::CalendarProvider
    } else {
        EventOrigin::LocallyDrafted
    };
    let candidate = TimedEvent::new(
        args.title,
        start,
        end,
        args.location.unwrap_or_default(),
        origin,
    );
    let mode = args.mode.unwrap_or(config.travel_mode);

    let events_path = args.events.or_else(|| config.local_events_path());
    let mut local = match &events_path {
        Some(path) => LocalStore::load(path)
            .with_context(|| format!("Could not read events from {}", path.display()))?,
        None => LocalStore::default(),
    };
    debug!(path = ?events_path, events = local.events().len(), "local events loaded");

    let remote = if args.calendar {
        let calendar = config.calendar()?.ok_or_else(|| {
            anyhow!("No calendar configured. Add a [calendar] section to the config file.")
        })?;
        debug!(provider = calendar.provider().binary_name(), "using calendar provider");
        Some(calendar)
    } else {
        None
    };
    let calendar = remote.as_ref().map(|c| c as &dyn CalendarProvider);

    let estimator = config.estimator();
    let policy = config.policy();

    let mut cycle = Cycle::draft(candidate, mode)?;

    let spinner = tui::create_spinner(format!("Checking {}...", cycle.candidate().date()));
    let evaluated = cycle.evaluate(&local, calendar, &estimator, &policy).await;
    spinner.finish_and_clear();
    let recommendation = evaluated?;

    println!();
    println!(
        "  {} {}",
        cycle.candidate().render(),
        format!("({})", cycle.mode()).dimmed()
    );
    println!("{}", recommendation.render());
    println!();

    let delay = if recommendation.is_ok() {
        false
    } else {
        match args.decision {
            Decision::NoApply => return Ok(()),
            Decision::Accept => true,
            Decision::Ask => match prompt_warning(&recommendation)? {
                Some(delay) => delay,
                None => {
                    println!("{}", "  Nothing saved".dimmed());
                    return Ok(());
                }
            },
        }
    };
    if args.decision == Decision::NoApply {
        return Ok(());
    }

    if delay {
        let mut rescheduler = Rescheduler::new(&mut local, calendar);
        let report = cycle.accept(&mut rescheduler).await?;
        println!("{}", report.render());
        if !report.is_complete() && args.decision == Decision::Ask {
            retry_failures(&mut rescheduler, &report.failed).await;
        }
    }

    persist_and_save(&mut cycle, &mut local, calendar, events_path.as_deref()).await?;

    if events_path.is_none() && !args.calendar {
        println!(
            "{}",
            "  No local events file configured; the draft was not written anywhere".yellow()
        );
        return Ok(());
    }

    println!("{}", format!("  Saved: {}", cycle.candidate().render()).green());

    Ok(())
}

/// Persist the candidate, then write the local store back whatever the outcome.
///
/// Shifts applied by an accepted delay are already live in the calendar, so
/// the local half of the cascade is saved even when the candidate itself
/// could not be stored.
async fn persist_and_save(
    cycle: &mut Cycle,
    local: &mut LocalStore,
    calendar: Option<&dyn CalendarProvider>,
    events_path: Option<&Path>,
) -> Result<String> {
    let persisted = {
        let mut rescheduler = Rescheduler::new(local, calendar);
        cycle.persist(&mut rescheduler).await
    };

    if let Some(path) = events_path {
        local
            .save(path)
            .with_context(|| format!("Could not write events to {}", path.display()))?;
    }

    Ok(persisted?)
}

/// `Some(true)` to delay, `Some(false)` to keep the original time, `None` to cancel.
fn prompt_warning(recommendation: &Recommendation) -> Result<Option<bool>> {
    let options = vec![
        delay_option(recommendation),
        "Keep the original time".to_string(),
        "Cancel".to_string(),
    ];

    let selection = Select::new()
        .with_prompt("  What now?")
        .items(&options)
        .default(0)
        .interact()?;

    Ok(match selection {
        0 => Some(true),
        1 => Some(false),
        _ => None,
    })
}

fn delay_option(recommendation: &Recommendation) -> String {
    let exact = recommendation.required_delay_minutes;
    let shown = recommendation.display_delay_minutes;
    if exact == shown {
        format!("Delay by {} minutes (later events move too)", exact)
    } else {
        format!(
            "Delay by about {} minutes ({} exactly, later events move too)",
            shown, exact
        )
    }
}

async fn retry_failures(rescheduler: &mut Rescheduler<'_>, failed: &[RescheduleFailure]) {
    for failure in failed {
        let again = Confirm::new()
            .with_prompt(format!("  Retry moving '{}'?", failure.event.title))
            .default(true)
            .interact()
            .unwrap_or(false);
        if !again {
            continue;
        }

        match rescheduler.retry(failure).await {
            Ok(()) => println!("{}", format!("  Moved: {}", failure.event.title).green()),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| anyhow!("Could not parse date/time: \"{}\" (try 2025-03-20T15:00)", input))
}

/// End from `--end`, else `--duration`, else one hour after start.
fn resolve_end(
    start: NaiveDateTime,
    end: Option<&str>,
    duration: Option<&str>,
) -> Result<NaiveDateTime> {
    if let Some(end) = end {
        return parse_datetime(end);
    }
    let Some(duration) = duration else {
        return Ok(start + Duration::hours(1));
    };

    let std_duration = humantime::parse_duration(duration.trim())
        .map_err(|e| anyhow!("Could not parse duration \"{}\": {}", duration, e))?;
    let duration = Duration::from_std(std_duration).context("Duration out of range")?;
    Ok(start + duration)
}
