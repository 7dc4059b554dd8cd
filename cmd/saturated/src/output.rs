//! Batch output.

use std::io::Write;

use parking_lot::Mutex;

/// Writes each batch as a single-line JSON array.
pub struct BatchWriter<W> {
    out: Mutex<W>,
    skip_empty: bool,
}

impl<W: Write> BatchWriter<W> {
    /// Creates a writer. With `skip_empty`, empty batches produce no output.
    pub fn new(out: W, skip_empty: bool) -> Self {
        Self {
            out: Mutex::new(out),
            skip_empty,
        }
    }

    /// Writes one batch and flushes the underlying writer.
    pub fn write_batch(&self, batch: &[String]) -> anyhow::Result<()> {
        if batch.is_empty() && self.skip_empty {
            return Ok(());
        }

        let line = serde_json::to_string(batch)?;
        let mut out = self.out.lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}
