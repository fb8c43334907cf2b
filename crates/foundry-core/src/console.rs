//! Diagnostic log buffer shown by the full display's console view

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Shared, append-only list of log lines
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, line: impl Into<String>) {
        self.lines.lock().push(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Lines appended at or after `cursor`, with the cursor for the next read
    pub fn lines_since(&self, cursor: usize) -> (Vec<String>, usize) {
        let lines = self.lines.lock();
        let start = cursor.min(lines.len());
        (lines[start..].to_vec(), lines.len())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Writer for a `tracing_subscriber` fmt layer
    pub fn writer(&self) -> ConsoleWriter {
        ConsoleWriter {
            log: self.clone(),
            buffer: Vec::new(),
        }
    }
}

/// Collects bytes and appends them to the log line by line on flush or drop
#[derive(Debug)]
pub struct ConsoleWriter {
    log: ConsoleLog,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn drain(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        let mut lines = self.log.lines.lock();
        lines.extend(text.lines().map(str::to_string));
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        self.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lines_since_cursor() {
        let log = ConsoleLog::new();
        log.append("one");
        log.append("two");

        let (lines, cursor) = log.lines_since(0);
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(cursor, 2);

        log.append("three");
        let (lines, cursor) = log.lines_since(cursor);
        assert_eq!(lines, vec!["three"]);
        assert_eq!(cursor, 3);

        let (lines, _) = log.lines_since(10);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_writer_splits_lines_on_drop() {
        let log = ConsoleLog::new();
        {
            let mut writer = log.writer();
            writer.write_all(b"INFO first\nINFO ").unwrap();
            writer.write_all(b"second\n").unwrap();
            assert!(log.is_empty());
        }
        assert_eq!(log.snapshot(), vec!["INFO first", "INFO second"]);
    }

    #[test]
    fn test_clones_share_lines() {
        let log = ConsoleLog::new();
        let other = log.clone();
        other.append("shared");
        assert_eq!(log.len(), 1);
    }
}
