//! Offset-indexed scanning of record buffers.
//!
//! A [`RecordScanner`] walks a buffer containing a sequence of fixed- or
//! variable-length records and indexes every record's start offset up
//! front. Construction rejects buffers whose framing cannot be trusted —
//! a record declaring zero length, a size field running off the end, or
//! records overrunning the buffer — so iteration afterwards never reads
//! out of bounds. The scanner yields offsets; callers decode typed views
//! at those offsets.

use thiserror::Error;

/// How record boundaries are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Every record occupies exactly `stride` bytes.
    Fixed { stride: usize },
    /// Each record carries its own total length in a 4-byte field at
    /// `size_field_offset` from the start of the record, stored
    /// big-endian when `big_endian` is set.
    Variable {
        size_field_offset: usize,
        big_endian: bool,
    },
}

/// Reasons a buffer is rejected at construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("record at offset {0} declares zero length")]
    ZeroLengthRecord(usize),

    #[error("record size field at offset {0} runs past the end of the buffer")]
    TruncatedSizeField(usize),

    #[error("records run past the end of the buffer ({end} > {len})")]
    Overrun { end: usize, len: usize },

    #[error("fixed record stride must be nonzero")]
    ZeroStride,
}

pub struct RecordScanner<'a> {
    buf: &'a [u8],
    offsets: Vec<usize>,
    cursor: usize,
}

impl<'a> RecordScanner<'a> {
    /// Index `buf`, recording the start offset of every record.
    pub fn new(buf: &'a [u8], framing: Framing) -> Result<Self, ScanError> {
        let mut offsets = Vec::new();
        let mut at = 0usize;

        match framing {
            Framing::Fixed { stride } => {
                if stride == 0 {
                    return Err(ScanError::ZeroStride);
                }
                while at < buf.len() {
                    offsets.push(at);
                    at += stride;
                }
            }
            Framing::Variable {
                size_field_offset,
                big_endian,
            } => {
                while at + size_field_offset < buf.len() {
                    let field = at + size_field_offset;
                    let raw: [u8; 4] = match buf.get(field..field + 4) {
                        Some(raw) => raw.try_into().unwrap(),
                        None => return Err(ScanError::TruncatedSizeField(field)),
                    };
                    let size = if big_endian {
                        u32::from_be_bytes(raw)
                    } else {
                        u32::from_le_bytes(raw)
                    } as usize;
                    if size == 0 {
                        return Err(ScanError::ZeroLengthRecord(at));
                    }
                    offsets.push(at);
                    at += size;
                }
            }
        }

        if at > buf.len() {
            return Err(ScanError::Overrun {
                end: at,
                len: buf.len(),
            });
        }

        Ok(Self {
            buf,
            offsets,
            cursor: 0,
        })
    }

    /// Number of records found during the pre-scan.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Offset of the next record, advancing the iteration cursor.
    /// `None` once exhausted.
    pub fn next_offset(&mut self) -> Option<usize> {
        let off = self.offsets.get(self.cursor).copied();
        if off.is_some() {
            self.cursor += 1;
        }
        off
    }

    /// Random-access lookup of a record's offset.
    pub fn offset_at(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Index the next `next_offset` call will yield.
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// Rewind iteration without re-scanning.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// The bytes of the record starting at `offset`, through the end of
    /// the buffer.
    pub fn tail_at(&self, offset: usize) -> &'a [u8] {
        &self.buf[offset..]
    }
}
