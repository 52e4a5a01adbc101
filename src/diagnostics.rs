//! Diagnostics emitted while loading an X file.
//!
//! Every hard failure is reported exactly once, soft conditions (an unknown template that gets skipped, a number
//! in a text file that doesn't parse) are reported as they happen. Where the messages end up is decided by the
//! `Reporter` passed to the loader.

use log::{error, info, warn};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where in the parsed buffer something happened. Binary files only have byte offsets, text files also carry the
/// line and column (both 1-based) of the offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Location {
    Byte(usize),
    Text {
        offset: usize,
        line: usize,
        column: usize,
    },
}

impl Location {
    /// Translates a byte offset into `text` into a line/column location. Offsets past the end are clamped.
    pub fn in_text(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);

        Location::Text {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }

    pub fn offset(&self) -> usize {
        match *self {
            Location::Byte(offset) | Location::Text { offset, .. } => offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Byte(offset) => write!(f, "byte {:#x}", offset),
            Location::Text { line, column, .. } => write!(f, "line {}, column {}", line, column),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Identifies the file being parsed, usually its path.
    pub source: String,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}: {}",
            self.source, self.severity, self.location, self.message
        )
    }
}

/// The sink diagnostics are sent to. The parser never keeps diagnostics itself.
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade at the matching level.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => info!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Error => error!("{}", diagnostic),
        }
    }
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_locations_are_one_based() {
        let text = "Header {\n 1;\n 0;\n}";

        assert_eq!(
            Location::in_text(text, 0),
            Location::Text {
                offset: 0,
                line: 1,
                column: 1
            }
        );
        assert_eq!(
            Location::in_text(text, 10),
            Location::Text {
                offset: 10,
                line: 2,
                column: 2
            }
        );
        assert_eq!(Location::in_text(text, 1000).offset(), text.len());
    }

    #[test]
    fn vec_collects_in_order() {
        let mut sink = Vec::new();
        for offset in 0..3 {
            sink.report(Diagnostic {
                severity: Severity::Warning,
                source: "a.x".to_string(),
                location: Location::Byte(offset),
                message: format!("#{}", offset),
            });
        }

        assert_eq!(sink.len(), 3);
        assert_eq!(sink[2].message, "#2");
        assert_eq!(
            sink[0].to_string(),
            "a.x: warning at byte 0x0: #0".to_string()
        );
    }
}
