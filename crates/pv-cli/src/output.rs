//! Output helpers shared by all subcommands.

use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result in the requested format.
///
/// JSON output is always emitted, even under `--quiet`: quiet suppresses
/// human chatter, not machine-readable results.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, _quiet: bool) {
    match format {
        OutputFormat::Json => {
            match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to serialize output: {e}"),
            }
        }
        OutputFormat::Text => {
            // Text rendering is command-specific; commands only call this
            // for JSON. Fall back to JSON rather than printing nothing.
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{json}");
            }
        }
    }
}

/// Format millimeters as meters for human output.
pub fn mm_to_m(mm: f64) -> f64 {
    mm / 1000.0
}
