//! Destinations for the human-readable run output.
//!
//! Warnings go to standard error, diffs and the summary to standard output.

pub trait ReportSink {
    fn warning(&mut self, message: &str);
    fn diff(&mut self, text: &str);
    fn summary(&mut self, line: &str);
}

/// Writes to the process's standard streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn warning(&mut self, message: &str) {
        eprintln!("WARNING: {message}");
    }

    fn diff(&mut self, text: &str) {
        print!("{text}");
    }

    fn summary(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Collects output in memory for inspection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferSink {
    pub warnings: Vec<String>,
    pub diffs: Vec<String>,
    pub summary: Vec<String>,
}

impl ReportSink for BufferSink {
    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn diff(&mut self, text: &str) {
        self.diffs.push(text.to_string());
    }

    fn summary(&mut self, line: &str) {
        self.summary.push(line.to_string());
    }
}
