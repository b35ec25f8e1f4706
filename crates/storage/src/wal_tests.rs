// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use wrkr_core::JobStatus;

fn started() -> JobEvent {
    JobEvent::StatusChanged {
        from: JobStatus::Pending,
        to: JobStatus::Running,
    }
}

fn advanced(index: usize) -> JobEvent {
    JobEvent::StepAdvanced {
        next_step_index: index,
    }
}

#[test]
fn wal_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(Utc::now(), &started()).unwrap();
        wal.append(Utc::now(), &advanced(1)).unwrap();
    }

    let entries = Wal::replay(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].event().unwrap(), started());
    assert_eq!(entries[1].event().unwrap(), advanced(1));
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn wal_sequence_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 0);
        wal.append(Utc::now(), &advanced(1)).unwrap();
        assert_eq!(wal.sequence(), 1);
    }

    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 1);
        let entry = wal.append(Utc::now(), &advanced(2)).unwrap();
        assert_eq!(entry.seq, 2);
    }
}

#[test]
fn replay_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Wal::replay(&dir.path().join("nope.jsonl"))
        .unwrap()
        .is_empty());
}

#[test]
fn trailing_partial_line_is_ignored_then_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(Utc::now(), &started()).unwrap();
    }
    let good_len = std::fs::metadata(&path).unwrap().len();
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"seq":2,"created_at":"#).unwrap();
    }

    assert_eq!(Wal::replay(&path).unwrap().len(), 1);

    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);
    assert_eq!(wal.offset(), good_len);
    wal.append(Utc::now(), &advanced(1)).unwrap();
    assert_eq!(Wal::replay(&path).unwrap().len(), 2);
}

#[test]
fn complete_garbage_line_is_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(Utc::now(), &started()).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not json\n").unwrap();
    }
    let err = Wal::replay(&path).unwrap_err();
    assert!(matches!(err, WalError::Corrupt { .. }), "{err}");
}

#[test]
fn checksum_mismatch_is_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(Utc::now(), &advanced(1)).unwrap();
    }
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(
        &path,
        content.replace("\"next_step_index\":1", "\"next_step_index\":7"),
    )
    .unwrap();

    let err = Wal::replay(&path).unwrap_err();
    match err {
        WalError::Corrupt { offset, reason } => {
            assert_eq!(offset, 0);
            assert!(reason.contains("checksum"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_from_offset_returns_only_new_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path).unwrap();
    wal.append(Utc::now(), &advanced(1)).unwrap();

    let first = Wal::read_from(&path, 0).unwrap();
    assert_eq!(first.entries.len(), 1);
    assert_eq!(first.end_offset, wal.offset());

    wal.append(Utc::now(), &advanced(2)).unwrap();
    let second = Wal::read_from(&path, first.end_offset).unwrap();
    assert_eq!(second.entries.len(), 1);
    assert_eq!(second.entries[0].seq, 2);
    assert_eq!(second.end_offset, wal.offset());
}
