use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log targets of the workspace crates.
pub const WORKSPACE_TARGETS: [&str; 4] = ["qa_bot_backend", "api", "qa_engine", "embedding_service"];

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // Keep timestamps compact: no fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Formatting layer for the whole process.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (duration of instrumented functions)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
}

/// Level directives for every workspace crate, e.g. `qa_engine=debug`.
pub fn level_directives(level: Level) -> Result<Vec<Directive>, ParseError> {
    let level = level.as_str().to_lowercase();
    WORKSPACE_TARGETS
        .iter()
        .map(|target| Directive::from_str(&format!("{target}={level}")))
        .collect()
}

/// `RUST_LOG` if set, else `default` globally plus `level` for workspace crates.
pub fn env_filter_with_level(default: &str, level: Level) -> Result<EnvFilter, ParseError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    level_directives(level)?
        .into_iter()
        .try_fold(EnvFilter::try_new(default)?, |f, d| Ok(f.add_directive(d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_workspace_crates() {
        let ds = level_directives(Level::DEBUG).unwrap();
        let rendered: Vec<String> = ds.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "qa_bot_backend=debug",
                "api=debug",
                "qa_engine=debug",
                "embedding_service=debug"
            ]
        );
    }

    #[test]
    fn timer_writes_rfc3339() {
        let mut s = String::new();
        ChronoRfc3339Utc
            .format_time(&mut Writer::new(&mut s))
            .unwrap();
        assert!(s.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&s).is_ok());
    }
}
