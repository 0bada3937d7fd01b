//! JSON lines output formatting.

use crate::scanner::{Reply, ReplySink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes one JSON object per reply, e.g.
/// `{"host":"10.0.0.1","time_ms":3,"attempt":1}`.
pub struct JsonSink<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> ReplySink for JsonSink<W> {
    fn emit(&self, reply: &Reply) {
        let Ok(line) = serde_json::to_string(reply) else {
            return;
        };
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // A closed stdout must not abort the sweep.
        let _ = writeln!(out, "{}", line).and_then(|_| out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_json_line() {
        let sink = JsonSink::new(Vec::new());
        sink.emit(&Reply::new("10.0.0.1".parse().unwrap(), Duration::from_millis(3), 2));

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "{\"host\":\"10.0.0.1\",\"time_ms\":3,\"attempt\":2}\n");
    }
}
