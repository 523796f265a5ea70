use colored::Colorize;
use undoable::{ActionOutcome, ActionStatus, OutcomeSummary};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Outcomes
// ============================================================================

/// Glyph for an action status
pub fn status_glyph(status: ActionStatus) -> String {
    match status {
        ActionStatus::Ok => "✓".green().to_string(),
        ActionStatus::Failed => "✗".red().to_string(),
        ActionStatus::Skipped => "○".dimmed().to_string(),
    }
}

/// One outcome as a single display line
pub fn outcome_line(outcome: &ActionOutcome) -> String {
    let mut line = format!(
        "{} {} {} {}",
        status_glyph(outcome.status),
        outcome.feature.to_string().bold(),
        format!("[{}]", outcome.action_type).dimmed(),
        outcome.target
    );
    if let Some(error) = &outcome.error {
        line.push_str(&format!(" - {}", error.red()));
    } else if let Some(detail) = &outcome.detail {
        line.push_str(&format!(" - {}", detail.dimmed()));
    }
    line
}

/// Print every outcome of a pass
pub fn outcomes(outcomes: &[ActionOutcome]) {
    for outcome in outcomes {
        println!("  {}", outcome_line(outcome));
    }
}

/// Print the closing summary of a pass
pub fn summary(verb: &str, summary: &OutcomeSummary) {
    println!();
    if summary.is_success() {
        println!("  {} {verb} finished", "✓".green().bold());
    } else {
        println!("  {} {verb} finished with errors", "⚠".yellow().bold());
    }

    if summary.ok > 0 {
        println!("    • {} action(s) succeeded", summary.ok);
    }
    if summary.skipped > 0 {
        println!("    • {} action(s) skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} action(s) {}", summary.failed, "failed".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use undoable::Feature;

    fn outcome(status: ActionStatus) -> ActionOutcome {
        ActionOutcome {
            feature: Feature::Widgets,
            action_type: "RegistryValue".into(),
            target: "HKCU\\Software\\Test\\TaskbarDa".into(),
            status,
            error: None,
            detail: None,
        }
    }

    #[test]
    fn test_outcome_line_prefers_error() {
        colored::control::set_override(false);
        let line = outcome_line(
            &outcome(ActionStatus::Failed)
                .with_error("permission denied: TaskbarDa")
                .with_detail("unused"),
        );
        assert_eq!(
            line,
            "✗ Widgets [RegistryValue] HKCU\\Software\\Test\\TaskbarDa - permission denied: TaskbarDa"
        );
    }

    #[test]
    fn test_outcome_line_shows_detail() {
        colored::control::set_override(false);
        let line = outcome_line(&outcome(ActionStatus::Skipped).with_detail("dry run: Set"));
        assert!(line.starts_with("○ Widgets"));
        assert!(line.ends_with("- dry run: Set"));
    }
}
