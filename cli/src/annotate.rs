//! Annotation log: one JSON record per processed frame.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct AnnotationWriter {
    writer: BufWriter<File>,
    records: u64,
}

impl AnnotationWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    /// Flush buffered records; returns how many were written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.records)
    }
}
