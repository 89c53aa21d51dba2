//! Best-effort reporting of job errors.

use std::io::Write;
use std::sync::Mutex;

/// Destination for the descriptions of failed jobs.
///
/// Wraps the caller-supplied writer behind a mutex since every worker
/// reports through the same sink. Reporting is best effort: a failed or
/// poisoned write is discarded, never retried, and never propagated.
pub(crate) struct ErrorSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ErrorSink {
    pub(crate) fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one line describing a failed job.
    pub(crate) fn report(&self, description: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{description}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl SharedWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink unavailable"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn report_appends_one_line_per_failure() {
        let writer = SharedWriter::default();
        let sink = ErrorSink::new(Box::new(writer.clone()));
        sink.report("job 1 failed");
        sink.report("job 2 failed");

        assert_eq!(writer.contents(), "job 1 failed\njob 2 failed\n");
    }

    #[test]
    fn failed_write_is_ignored() {
        let sink = ErrorSink::new(Box::new(FailingWriter));
        // Must not panic or propagate.
        sink.report("job failed");
    }
}
