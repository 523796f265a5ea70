//! Terminal progress for apply and revert passes
//!
//! Draws an indicatif bar, prints one line per finished action, and mirrors
//! every event into the run transcript when one is attached.

use indicatif::{ProgressBar, ProgressStyle};
use undoable::{
    Action, ActionOutcome, ActionStatus, OutcomeSummary, Pass, ProgressCallback, Transcript,
};

use crate::ui;

pub struct TerminalProgress {
    bar: ProgressBar,
    quiet: bool,
    transcript: Option<Transcript>,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            quiet,
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// A transcript that fails to write is dropped after one warning
    fn record(&mut self, message: &str) {
        if let Some(transcript) = self.transcript.as_mut()
            && let Err(e) = transcript.line(message)
        {
            log::warn!("Transcript disabled: {e}");
            self.transcript = None;
        }
    }
}

fn pass_name(pass: Pass) -> &'static str {
    match pass {
        Pass::Apply => "apply",
        Pass::Revert => "revert",
    }
}

fn status_label(status: ActionStatus) -> &'static str {
    match status {
        ActionStatus::Ok => "OK",
        ActionStatus::Failed => "FAILED",
        ActionStatus::Skipped => "SKIPPED",
    }
}

/// Transcript line for a finished action
fn outcome_record(index: usize, outcome: &ActionOutcome) -> String {
    let mut line = format!(
        "#{} {} {} [{}] {}",
        index + 1,
        status_label(outcome.status),
        outcome.feature,
        outcome.action_type,
        outcome.target
    );
    if let Some(error) = &outcome.error {
        line.push_str(&format!(": {error}"));
    } else if let Some(detail) = &outcome.detail {
        line.push_str(&format!(": {detail}"));
    }
    line
}

impl ProgressCallback for TerminalProgress {
    fn on_pass_start(&mut self, pass: Pass, count: usize) {
        if !self.quiet {
            self.bar = ProgressBar::new(count as u64);
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
        }
        self.record(&format!("{} pass started: {count} action(s)", pass_name(pass)));
    }

    fn on_action_start(&mut self, index: usize, action: &Action) {
        self.bar.set_message(action.target());
        self.record(&format!("#{} {}", index + 1, action.describe()));
    }

    fn on_action_complete(&mut self, index: usize, outcome: &ActionOutcome) {
        if !self.quiet {
            self.bar.suspend(|| println!("  {}", ui::outcome_line(outcome)));
        }
        self.bar.inc(1);
        self.record(&outcome_record(index, outcome));
    }

    fn on_pass_complete(&mut self, outcomes: &[ActionOutcome]) {
        self.bar.finish_and_clear();
        let summary = OutcomeSummary::from_outcomes(outcomes);
        self.record(&format!(
            "pass complete: {} ok, {} failed, {} skipped",
            summary.ok, summary.failed, summary.skipped
        ));
    }
}
