//! Colored terminal rendering for detour-core types.

use detour_core::conflict::PairKind;
use detour_core::recommend::PairReport;
use detour_core::reschedule::{RescheduleFailure, ShiftedEvent};
use detour_core::{Recommendation, RescheduleReport, TimedEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for PairKind {
    fn render(&self) -> String {
        match self {
            PairKind::Safe => "✓".green().to_string(),
            PairKind::TravelInfeasible => "~".yellow().to_string(),
            PairKind::Overlap => "✗".red().to_string(),
        }
    }
}

impl Render for TimedEvent {
    fn render(&self) -> String {
        let mut line = format!("{} {}", self.title.bold(), self.render_time().dimmed());
        if self.has_location() {
            line.push_str(&format!(" {}", format!("@ {}", self.location).dimmed()));
        }
        line
    }
}

impl Render for PairReport {
    fn render(&self) -> String {
        let mut line = format!("{} {}", self.result.kind.render(), self.other.render());

        let detail = match self.result.kind {
            PairKind::Safe => None,
            PairKind::Overlap => {
                Some(format!("overlap, +{} min", self.result.required_delay_minutes))
            }
            PairKind::TravelInfeasible => Some(format!(
                "travel too tight, +{} min",
                self.result.required_delay_minutes
            )),
        };
        if let Some(detail) = detail {
            line.push_str(&format!("  {}", detail.yellow()));
        }
        if let Some(travel) = self.result.travel.filter(|t| t.is_available()) {
            line.push_str(&format!(" {}", format!("(travel {})", travel).dimmed()));
        }
        line
    }
}

impl Render for Recommendation {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        if self.is_ok() {
            lines.push(format!("  {}", self.message.green()));
        } else {
            lines.push(format!("  {}", self.message.yellow()));
        }

        let mut pairs: Vec<&PairReport> = self.pairs.iter().collect();
        pairs.sort_by_key(|p| p.other.start);
        for pair in pairs {
            lines.push(format!("     {}", pair.render()));
        }

        lines.join("\n")
    }
}

impl Render for ShiftedEvent {
    fn render(&self) -> String {
        format!(
            "{} {}",
            self.title,
            format!("{} → {}", self.start.format("%H:%M"), self.end.format("%H:%M")).dimmed()
        )
    }
}

impl Render for RescheduleFailure {
    fn render(&self) -> String {
        format!("{} {}", self.event.title.red(), self.error.dimmed())
    }
}

impl Render for RescheduleReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        if self.is_noop() {
            lines.push(format!("  {}", "Nothing else on the day needed moving".dimmed()));
        } else {
            let label = format!(
                "Moved {} {} by {} minutes",
                self.shifted.len(),
                pluralize("event", self.shifted.len()),
                self.delay_minutes
            );
            lines.push(format!("  {}", label.green()));
            for shifted in &self.shifted {
                lines.push(format!("     {} {}", "~".yellow(), shifted.render()));
            }
        }

        if !self.failed.is_empty() {
            let label = format!(
                "Could not move {} {}",
                self.failed.len(),
                pluralize("event", self.failed.len())
            );
            lines.push(format!("  {}", label.red()));
            for failure in &self.failed {
                lines.push(format!("     {} {}", "✗".red(), failure.render()));
            }
        }

        lines.join("\n")
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
