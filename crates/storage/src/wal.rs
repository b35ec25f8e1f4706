// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-job event log
//!
//! Only complete lines count. A trailing line without its newline is an
//! interrupted append: readers ignore it and the next writer truncates it.
//! A complete line that fails to decode or verify is corruption.

use crate::event::{JobEvent, WalEntry};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in event log operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt entry at byte {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },
}

/// Writer half of the event log. Callers must hold the job's busy lock.
pub struct Wal {
    file: File,
    sequence: u64,
    offset: u64,
}

/// Entries read from a log plus the offset just past the last complete line
#[derive(Debug, Default)]
pub struct Scan {
    pub entries: Vec<WalEntry>,
    pub end_offset: u64,
}

impl Wal {
    /// Open or create the log, dropping any interrupted trailing append
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let scan = Self::read_from(path, 0)?;
        if file.metadata()?.len() > scan.end_offset {
            tracing::warn!(
                path = %path.display(),
                offset = scan.end_offset,
                "truncating interrupted event log append"
            );
            file.set_len(scan.end_offset)?;
            file.sync_all()?;
        }
        let sequence = scan.entries.last().map(|e| e.seq).unwrap_or(0);

        Ok(Self {
            file,
            sequence,
            offset: scan.end_offset,
        })
    }

    /// Append an event; the entry is durable when this returns
    pub fn append(
        &mut self,
        created_at: DateTime<Utc>,
        event: &JobEvent,
    ) -> Result<WalEntry, WalError> {
        let entry = WalEntry::new(self.sequence + 1, created_at, event)?;
        let mut line = entry.to_line()?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.sync_all()?;
        self.sequence = entry.seq;
        self.offset += line.len() as u64;
        Ok(entry)
    }

    /// Sequence number of the last entry
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Byte length of the log's complete lines
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Replay all entries from the log
    pub fn replay(path: &Path) -> Result<Vec<WalEntry>, WalError> {
        Ok(Self::read_from(path, 0)?.entries)
    }

    /// Read complete entries starting at byte `offset`
    pub fn read_from(path: &Path, offset: u64) -> Result<Scan, WalError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Scan {
                    entries: Vec::new(),
                    end_offset: offset,
                })
            }
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let complete = match buf.iter().rposition(|b| *b == b'\n') {
            Some(last_newline) => &buf[..=last_newline],
            None => &buf[..0],
        };

        let mut entries = Vec::new();
        let mut line_start = offset;
        for raw in complete.split_inclusive(|b| *b == b'\n') {
            let line_offset = line_start;
            line_start += raw.len() as u64;
            let text = std::str::from_utf8(raw).map_err(|e| WalError::Corrupt {
                offset: line_offset,
                reason: e.to_string(),
            })?;
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let entry: WalEntry = serde_json::from_str(text).map_err(|e| WalError::Corrupt {
                offset: line_offset,
                reason: e.to_string(),
            })?;
            if !entry.verify() {
                return Err(WalError::Corrupt {
                    offset: line_offset,
                    reason: format!("checksum mismatch for seq {}", entry.seq),
                });
            }
            entries.push(entry);
        }

        Ok(Scan {
            entries,
            end_offset: offset + complete.len() as u64,
        })
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
