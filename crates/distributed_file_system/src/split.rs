//! Input splits and the line records read from them.

use std::{ops::Range, path::PathBuf};

use serde::{Deserialize, Serialize};

pub type SplitId = usize;

/// The last split of a file may be up to this much larger than the split size
/// instead of leaving a tiny tail split.
pub const SPLIT_SLOP: f64 = 1.1;

/// Contiguous byte range of one input file, processed by one map task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSplit {
    /// Id of the split, unique within a job.
    pub id: SplitId,
    /// Local file backing the split.
    pub file: PathBuf,
    /// Offset of the first byte.
    pub start: u64,
    /// Length in bytes.
    pub length: u64,
}

impl InputSplit {
    /// Offset right after the last byte of the split.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Cuts a file of `file_len` bytes into splits of `split_size` bytes, numbering them from `first_id`.
///
/// An empty file still gets one empty split.
pub fn compute_splits(file: PathBuf, file_len: u64, split_size: u64, first_id: SplitId) -> Vec<InputSplit> {
    let split_size = split_size.max(1);
    let mut splits = Vec::new();
    let mut remaining = file_len;
    while remaining as f64 / split_size as f64 > SPLIT_SLOP {
        splits.push(InputSplit {
            id: first_id + splits.len(),
            file: file.clone(),
            start: file_len - remaining,
            length: split_size,
        });
        remaining -= split_size;
    }
    if remaining > 0 || splits.is_empty() {
        splits.push(InputSplit {
            id: first_id + splits.len(),
            file,
            start: file_len - remaining,
            length: remaining,
        });
    }
    splits
}

/// Lines of one split, held in a single buffer.
///
/// Line terminators (`\n` and a preceding `\r`) are not part of the records.
pub struct SplitRecords {
    data: Vec<u8>,
    lines: Vec<Range<usize>>,
}

impl SplitRecords {
    /// Indexes the lines of `data`. A trailing line without a terminator is kept.
    pub fn new(data: Vec<u8>) -> Self {
        let mut lines = Vec::new();
        let mut begin = 0;
        for (pos, &byte) in data.iter().enumerate() {
            if byte == b'\n' {
                lines.push(trim_cr(&data, begin..pos));
                begin = pos + 1;
            }
        }
        if begin < data.len() {
            lines.push(trim_cr(&data, begin..data.len()));
        }
        SplitRecords { data, lines }
    }

    /// Iterates over records in file order.
    pub fn records(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(|range| &self.data[range.clone()])
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Size of the buffer, including line terminators.
    pub fn bytes(&self) -> usize {
        self.data.len()
    }
}

fn trim_cr(data: &[u8], range: Range<usize>) -> Range<usize> {
    if range.end > range.start && data[range.end - 1] == b'\r' {
        range.start..range.end - 1
    } else {
        range
    }
}
