use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use granary_api::event::AuditEvent;
use granary_api::store::AuditStore;

use crate::error::EngineError;

/// On-disk fallback tier: an append-only file of newline-delimited JSON
/// records, acting as a write-ahead log for events the primary store
/// rejected.
///
/// Written by the pipeline and the queue drain worker, read by the file
/// drain worker. Every access (append, drain, truncate) is serialized
/// behind one async lock, so concurrent callers cannot interleave partial
/// lines and a drain pass sees a stable file.
pub struct FallbackFile {
    path: PathBuf,
    cursor: Mutex<DrainCursor>,
}

/// Byte offset of the first line not yet confirmed inserted into the
/// primary store. Lines before the offset are consumed; the file is
/// truncated (and the offset rewound) once everything up to end-of-file
/// has been inserted.
struct DrainCursor {
    offset: u64,
}

impl FallbackFile {
    /// Open (creating if needed) the fallback file. Called once at
    /// bootstrap. Existing content is kept: records left over from a
    /// previous run are drained like any others.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            cursor: Mutex::new(DrainCursor { offset: 0 }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one serialized record as a single line.
    pub async fn append(&self, line: &str) -> Result<(), EngineError> {
        let _cursor = self.cursor.lock().await;
        let mut f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// One drain pass: replay every unconsumed line into the store, in
    /// file order. Returns the number of records inserted.
    ///
    /// A parse or insert failure aborts the pass with the offset still
    /// pointing at the failed line — it and everything after it are left
    /// for the next tick, so later records are never reordered past or
    /// dropped relative to earlier ones.
    pub async fn drain_into(&self, store: &dyn AuditStore) -> Result<usize, EngineError> {
        let mut cursor = self.cursor.lock().await;

        let f = File::open(&self.path)?;
        let mut reader = BufReader::new(f);
        reader.seek(SeekFrom::Start(cursor.offset))?;

        let mut drained = 0;
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                cursor.offset += n as u64;
                continue;
            }

            let event: AuditEvent = serde_json::from_str(trimmed)?;
            store.insert(&event).await.map_err(EngineError::Store)?;
            cursor.offset += n as u64;
            drained += 1;
        }

        // Everything consumed: truncate and rewind while still holding
        // the lock, so no append can land between the check and set_len.
        let len = std::fs::metadata(&self.path)?.len();
        if len > 0 && cursor.offset >= len {
            OpenOptions::new().write(true).open(&self.path)?.set_len(0)?;
            cursor.offset = 0;
        }

        Ok(drained)
    }
}
