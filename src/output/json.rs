//! JSON-lines result stream.
//!
//! Appends one JSON object per delivered result to a file, after a single
//! header line identifying the stream. Lines are self-contained, so the file
//! stays readable even if the process dies mid-stream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use log::{error, info};
use parking_lot::Mutex;
use serde::Serialize;

use crate::profile::id::ProfilerId;
use crate::result::handler::ResultHandler;
use crate::result::tree::ResultTree;
use crate::utils::config::{STREAM_FORMAT, STREAM_VERSION};
use crate::utils::error::OutputError;

/// First line of every stream
#[derive(Serialize)]
struct StreamHeader {
    version: u32,
    format: &'static str,
    generated_at: String,
}

/// One delivered result with enough identity to group lines by profiler
#[derive(Serialize)]
struct ResultRecord<'a> {
    profiler: &'a str,
    target_run_count: u32,
    result: &'a ResultTree,
}

/// Streams every delivered result to a JSON-lines file.
///
/// Writes are serialized through an internal lock, so one handler can serve
/// results finishing on many threads. I/O failures are logged and the
/// instrumented code never sees them.
pub struct JsonLinesHandler {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesHandler {
    /// Create (or truncate) the stream file and write its header line
    ///
    /// **Public** - main entry point for streaming output
    ///
    /// # Errors
    /// * `OutputError::WriteFailed` - file cannot be created or written
    /// * `OutputError::SerializationFailed` - header serialization error
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        info!("Writing profiling results to: {}", path.display());

        let file = File::create(path).map_err(OutputError::WriteFailed)?;
        let mut writer = BufWriter::new(file);

        let header = StreamHeader {
            version: STREAM_VERSION,
            format: STREAM_FORMAT,
            generated_at: Utc::now().to_rfc3339(),
        };
        serde_json::to_writer(&mut writer, &header).map_err(OutputError::SerializationFailed)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Append one record line
    ///
    /// **Private** - flushed per record: results are infrequent and a crash
    /// should lose at most the line being written
    fn write_record(&self, record: &ResultRecord<'_>) -> Result<(), OutputError> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record).map_err(OutputError::SerializationFailed)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ResultHandler for JsonLinesHandler {
    fn handle_result(&self, result: &ResultTree, profiler_id: &ProfilerId) {
        let record = ResultRecord {
            profiler: &profiler_id.name,
            target_run_count: profiler_id.target_run_count,
            result,
        };
        if let Err(e) = self.write_record(&record) {
            error!("Failed to write profiling result: {}", e);
        }
    }
}
