//! Output formatting module.
//!
//! Reply sinks for plain text and JSON lines, plus stderr diagnostics.

mod json_format;
mod plain;

pub use json_format::JsonSink;
pub use plain::{print_error, print_summary, print_warning, PlainSink};

use crate::cli::OutputFormat;
use crate::scanner::ReplySink;

/// Build the stdout sink for the requested format.
pub fn sink_for(format: OutputFormat) -> Box<dyn ReplySink> {
    match format {
        OutputFormat::Plain => Box::new(PlainSink::stdout()),
        OutputFormat::Json => Box::new(JsonSink::stdout()),
    }
}
