//! Output and input endpoints for a running program.
//!
//! Enum dispatch picks between the process streams and in-memory buffers;
//! tests run with buffers so output can be asserted on.

use std::io::{BufRead, Write};

#[derive(Debug)]
pub enum OutputSink {
    Stdout,
    Buffer(String),
}

impl OutputSink {
    pub fn buffer() -> Self {
        OutputSink::Buffer(String::new())
    }

    /// Print without newline.
    pub fn print(&mut self, text: &str) {
        match self {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                // A closed stdout has nowhere to report to.
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
            OutputSink::Buffer(buffer) => buffer.push_str(text),
        }
    }

    pub fn println(&mut self, text: &str) {
        self.print(text);
        self.print("\n");
    }

    /// Everything written so far. Always empty for stdout.
    pub fn get_output(&self) -> &str {
        match self {
            OutputSink::Stdout => "",
            OutputSink::Buffer(buffer) => buffer,
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::Stdout
    }
}

/// Each variant holds the text read but not yet consumed.
#[derive(Debug)]
pub enum InputSource {
    Stdin(String),
    Buffer(String),
}

impl InputSource {
    pub fn stdin() -> Self {
        InputSource::Stdin(String::new())
    }

    pub fn buffer(text: &str) -> Self {
        InputSource::Buffer(text.to_string())
    }

    fn pending(&mut self) -> &mut String {
        match self {
            InputSource::Stdin(pending) | InputSource::Buffer(pending) => pending,
        }
    }

    /// Pulls another line into the pending text. Returns false at end of input.
    fn refill(&mut self) -> bool {
        match self {
            InputSource::Stdin(pending) => {
                let mut line = String::new();
                match std::io::stdin().lock().read_line(&mut line) {
                    Ok(0) | Err(_) => false,
                    Ok(_) => {
                        pending.push_str(&line);
                        true
                    }
                }
            }
            InputSource::Buffer(_) => false,
        }
    }

    /// Reads up to the next newline, which is consumed but not returned.
    pub fn read_line(&mut self) -> Option<String> {
        if self.pending().is_empty() && !self.refill() {
            return None;
        }

        let pending = self.pending();
        let line: String = match pending.find('\n') {
            Some(end) => {
                let line = pending[..end].to_string();
                pending.drain(..=end);
                line
            }
            None => std::mem::take(pending),
        };

        Some(line.trim_end_matches('\r').to_string())
    }

    /// Reads the next whitespace-delimited token, crossing lines as needed.
    pub fn read_token(&mut self) -> Option<String> {
        loop {
            let pending = self.pending();
            let skipped = pending.len() - pending.trim_start().len();
            pending.drain(..skipped);

            if !pending.is_empty() {
                let end = pending.find(char::is_whitespace).unwrap_or(pending.len());
                return Some(pending.drain(..end).collect());
            }

            if !self.refill() {
                return None;
            }
        }
    }
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::stdin()
    }
}
