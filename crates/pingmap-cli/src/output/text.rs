//! Human-readable renderings.

use colored::Colorize;
use pingmap_core::{
    OutcomeStatus, ProviderRegistry, ResolvedUrlSet, RunOutcome, SubmissionOutcome,
};
use std::io::{self, Write};

fn marker(status: OutcomeStatus) -> colored::ColoredString {
    match status {
        OutcomeStatus::Success => status.marker().green(),
        OutcomeStatus::Warning => status.marker().yellow(),
        OutcomeStatus::Error => status.marker().red().bold(),
    }
}

pub fn write_outcome(w: &mut impl Write, outcome: &SubmissionOutcome) -> io::Result<()> {
    write!(
        w,
        "{} {}: {}",
        marker(outcome.status),
        outcome.provider.bold(),
        outcome.message
    )?;
    if let Some(detail) = &outcome.detail {
        write!(w, " ({})", detail.dimmed())?;
    }
    writeln!(w)
}

pub fn write_run(w: &mut impl Write, outcome: &RunOutcome) -> io::Result<()> {
    match outcome {
        RunOutcome::Skipped { reason, providers } => {
            writeln!(
                w,
                "{} Skipping sitemap submission: {reason}",
                marker(OutcomeStatus::Warning)
            )?;
            if !providers.is_empty() {
                writeln!(w, "  Skipped providers: {}", providers.join(", "))?;
            }
        },
        RunOutcome::Succeeded(aggregate) => {
            for item in &aggregate.outcomes {
                write_outcome(w, item)?;
            }
            writeln!(
                w,
                "{} Sitemap submission complete ({} providers)",
                marker(OutcomeStatus::Success),
                aggregate.outcomes.len()
            )?;
        },
        RunOutcome::Failed(aggregate) => {
            for item in &aggregate.outcomes {
                write_outcome(w, item)?;
            }
        },
    }
    Ok(())
}

pub fn write_urls(w: &mut impl Write, urls: &ResolvedUrlSet) -> io::Result<()> {
    for url in urls.iter() {
        writeln!(w, "{url}")?;
    }
    Ok(())
}

pub fn write_providers(w: &mut impl Write, registry: &ProviderRegistry) -> io::Result<()> {
    for spec in registry.iter() {
        let kind = spec.kind.to_string();
        writeln!(
            w,
            "{:<10} {:<11} {}",
            spec.name.bold(),
            kind,
            spec.endpoint.as_deref().unwrap_or("-")
        )?;
        writeln!(w, "{:<10} requires: {}", "", spec.required_inputs())?;
        if let Some(note) = &spec.note {
            writeln!(w, "{:<10} {}", "", note.dimmed())?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingmap_core::{AggregateResult, SkipReason};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_outcome_lines_carry_markers() {
        let outcome = RunOutcome::Failed(AggregateResult::from_outcomes(vec![
            SubmissionOutcome::error("google", "Submission failed", Some("HTTP 500".into())),
            SubmissionOutcome::success("indexnow", "Submitted 3 URLs (HTTP 200)"),
            SubmissionOutcome::warning("bing", "deprecated"),
        ]));
        let text = render(|w| write_run(w, &outcome));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✗ google: Submission failed (HTTP 500)");
        assert_eq!(lines[1], "✓ indexnow: Submitted 3 URLs (HTTP 200)");
        assert_eq!(lines[2], "⚠ bing: deprecated");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_skip_names_providers() {
        let outcome = RunOutcome::Skipped {
            reason: SkipReason::DryRun,
            providers: vec!["google".into(), "bing".into()],
        };
        let text = render(|w| write_run(w, &outcome));
        assert!(text.contains("Skipping sitemap submission: dry run"));
        assert!(text.contains("google, bing"));
    }

    #[test]
    fn test_providers_listing() {
        let text = render(|w| write_providers(w, &ProviderRegistry::builtin()));
        assert!(text.contains("https://www.google.com/ping"));
        assert!(text.contains("requires: URL list, IndexNow key, key location"));
    }
}
