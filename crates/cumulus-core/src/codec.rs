//! Packing and parsing of the binary parts protocol.
//!
//! The codec translates between [`PartDescriptor`] collections and the
//! wire format: [`pack_parts`] builds a request buffer, and
//! [`parse_parts_reply`] walks a reply buffer validating every record
//! against the caller's expectations. The codec never performs I/O and
//! never retains the buffers it is given — transport belongs to the
//! client crate, which hands raw reply bytes straight back here.
//!
//! Validation distinguishes two failure planes. Structural violations
//! (bad signatures, version or size skew, fingerprint mismatches) mean
//! the reply cannot be trusted at all and abort the parse with
//! [`MalformedResponse`]. A nonzero per-record error code means the
//! server could not produce that one part; the part's payload is
//! released and the parse continues, so the caller can retry just the
//! missing parts.

use bytes::Bytes;
use thiserror::Error;
use zerocopy::{AsBytes, FromBytes};

use crate::fingerprint::fingerprint;
use crate::part::PartDescriptor;
use crate::scanner::{Framing, RecordScanner, ScanError};
use crate::wire::{
    PartRecord, PartsHeader, FINGERPRINT_FIELD_LEN, HEADER_SIGNATURE, HEADER_SIZE, HEADER_VERSION,
    RECORD_SIGNATURE, RECORD_SIZE, RECORD_SIZE_FIELD_OFFSET, RECORD_VERSION,
};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Structural violations of a binary parts reply.
///
/// Every variant is fatal to the exchange: the reply does not correspond
/// to what was asked and cannot be partially trusted. These indicate
/// client/server protocol skew or corruption, not conditions to retry.
#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("reply shorter than the parts header")]
    TruncatedHeader,

    #[error("invalid header signature 0x{0:08x}")]
    HeaderSignature(u32),

    #[error("cloud rejected the exchange (code {code}): {message}")]
    ServerError { code: u32, message: String },

    #[error("header declares size {0}, this client compiled {HEADER_SIZE}")]
    HeaderSize(u32),

    #[error("unsupported header format version {0}")]
    HeaderVersion(u32),

    #[error("cloud returned {declared} records, {expected} were requested")]
    RecordCount { expected: u32, declared: u32 },

    #[error("reply body truncated: header declares {declared} bytes, {available} present")]
    TruncatedBody { declared: usize, available: usize },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("record at offset {0} truncated")]
    TruncatedRecord(usize),

    #[error("invalid record signature 0x{0:08x}")]
    RecordSignature(u32),

    #[error("reply carries more records than parts were requested")]
    ExcessRecords,

    #[error("record fingerprint {got} does not match requested part {want}")]
    FingerprintMismatch { want: String, got: String },

    #[error("record declares content size {declared}, requested part is {requested}")]
    SizeMismatch { declared: u32, requested: u32 },

    #[error("record payload size {payload} does not match declared content size {declared}")]
    PayloadSizeMismatch { declared: u32, payload: u32 },

    #[error("record size {record} inconsistent with declared content size {declared}")]
    RecordSizeMismatch { record: u32, declared: u32 },

    #[error("unsupported record format version {0}")]
    RecordVersion(u32),

    #[error("record payload for part {fingerprint} runs past the end of the reply")]
    TruncatedPayload { fingerprint: String },

    #[error("downloaded part {fingerprint} failed fingerprint verification")]
    PayloadIntegrity { fingerprint: String },
}

// ── Packing ───────────────────────────────────────────────────────────────────

/// A packed request buffer, ready to post.
#[derive(Debug)]
pub struct PackedParts {
    /// Header followed by one record (plus payload) per packed part.
    pub buffer: Vec<u8>,
    /// Records actually appended; parts that could not be packed are
    /// skipped without failing the batch.
    pub record_count: u32,
    /// Total payload bytes carried in the buffer.
    pub payload_bytes: u64,
}

/// Pack `parts` into a binary request message.
///
/// With `include_payload` each part's content is attached after its
/// record; otherwise records alone are sent (a presence check or a
/// download request). The header's `body_size` and `record_count`
/// reflect only the records actually appended.
pub fn pack_parts(parts: &[PartDescriptor], include_payload: bool, share_id: u32) -> PackedParts {
    let mut buffer = vec![0u8; HEADER_SIZE];
    let mut record_count = 0u32;
    let mut payload_bytes = 0u64;

    for part in parts {
        if append_record(&mut buffer, part, include_payload, share_id) {
            record_count += 1;
            if include_payload {
                payload_bytes += u64::from(part.size);
            }
        }
    }

    let body_size = (buffer.len() - HEADER_SIZE) as u32;
    let header = PartsHeader::new(body_size, record_count);
    buffer[..HEADER_SIZE].copy_from_slice(header.as_bytes());

    PackedParts {
        buffer,
        record_count,
        payload_bytes,
    }
}

/// Append one record for `part`, returning whether it was packed.
fn append_record(
    buffer: &mut Vec<u8>,
    part: &PartDescriptor,
    include_payload: bool,
    share_id: u32,
) -> bool {
    if part.size == 0 {
        tracing::debug!(fingerprint = %part.fingerprint, "skipping zero-length part");
        return false;
    }
    if part.fingerprint.len() >= FINGERPRINT_FIELD_LEN {
        tracing::warn!(fingerprint = %part.fingerprint, "skipping part with oversize fingerprint");
        return false;
    }

    let payload = if include_payload {
        match part.payload.as_deref() {
            Some(data) if data.len() == part.size as usize => Some(data),
            _ => {
                tracing::warn!(
                    fingerprint = %part.fingerprint,
                    "skipping part with missing or short payload"
                );
                return false;
            }
        }
    } else {
        None
    };

    let payload_size = payload.map_or(0, |data| data.len() as u32);
    let record = PartRecord::new(share_id, &part.fingerprint, part.size, payload_size);
    buffer.extend_from_slice(record.as_bytes());
    if let Some(data) = payload {
        buffer.extend_from_slice(data);
    }
    true
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a binary parts reply, returning the count of structurally valid
/// part records.
///
/// With `expected` supplied, every record is validated against the
/// corresponding requested part — in send order — and healthy payloads
/// are copied into the expected parts and fingerprint-verified. A record
/// whose own error code is nonzero consumes its expected part without
/// counting it, so the returned count may be less than the request count
/// when individual parts failed server-side.
///
/// `records_out`, when supplied, receives a decoded copy of every record
/// encountered regardless of outcome — the raw per-part status needed by
/// a presence check.
pub fn parse_parts_reply(
    reply: &[u8],
    mut expected: Option<&mut [PartDescriptor]>,
    mut records_out: Option<&mut Vec<PartRecord>>,
) -> Result<u32, MalformedResponse> {
    let header = PartsHeader::read_from_prefix(reply).ok_or(MalformedResponse::TruncatedHeader)?;

    if header.signature() != HEADER_SIGNATURE {
        return Err(MalformedResponse::HeaderSignature(header.signature()));
    }
    if header.error_code() != 0 {
        // The body is an error string, not record data.
        return Err(MalformedResponse::ServerError {
            code: header.error_code(),
            message: message_text(&reply[HEADER_SIZE..]),
        });
    }
    if header.header_size() as usize != HEADER_SIZE {
        return Err(MalformedResponse::HeaderSize(header.header_size()));
    }
    if header.format_version() != HEADER_VERSION {
        return Err(MalformedResponse::HeaderVersion(header.format_version()));
    }
    if let Some(parts) = expected.as_deref() {
        if parts.len() as u32 != header.record_count() {
            return Err(MalformedResponse::RecordCount {
                expected: parts.len() as u32,
                declared: header.record_count(),
            });
        }
    }

    let body_size = header.body_size() as usize;
    let body = reply
        .get(HEADER_SIZE..HEADER_SIZE + body_size)
        .ok_or(MalformedResponse::TruncatedBody {
            declared: body_size,
            available: reply.len().saturating_sub(HEADER_SIZE),
        })?;

    let mut scanner = RecordScanner::new(
        body,
        Framing::Variable {
            size_field_offset: RECORD_SIZE_FIELD_OFFSET,
            big_endian: true,
        },
    )?;

    // Records and expectations share send order; each record consumes
    // one expected part, failed or not.
    let mut next_expected = 0usize;
    let mut valid = 0u32;

    while let Some(offset) = scanner.next_offset() {
        let record = PartRecord::read_from_prefix(&body[offset..])
            .ok_or(MalformedResponse::TruncatedRecord(offset))?;

        if let Some(out) = records_out.as_deref_mut() {
            out.push(record.clone());
        }

        if record.signature() != RECORD_SIGNATURE {
            return Err(MalformedResponse::RecordSignature(record.signature()));
        }

        let Some(parts) = expected.as_deref_mut() else {
            if record.format_version() != RECORD_VERSION {
                return Err(MalformedResponse::RecordVersion(record.format_version()));
            }
            valid += 1;
            continue;
        };

        let part = parts
            .get_mut(next_expected)
            .ok_or(MalformedResponse::ExcessRecords)?;

        if record.error_code() != 0 {
            part.release_payload();
            let text = per_part_error_text(body, offset, &record);
            tracing::warn!(
                fingerprint = %part.fingerprint,
                code = record.error_code(),
                "cloud reported part error: {text}"
            );
            next_expected += 1;
            continue;
        }

        if !record.fingerprint_matches(&part.fingerprint) {
            return Err(MalformedResponse::FingerprintMismatch {
                want: part.fingerprint.clone(),
                got: record.fingerprint_text(),
            });
        }
        if record.declared_size() != part.size {
            return Err(MalformedResponse::SizeMismatch {
                declared: record.declared_size(),
                requested: part.size,
            });
        }
        if record.payload_size() != record.declared_size() {
            return Err(MalformedResponse::PayloadSizeMismatch {
                declared: record.declared_size(),
                payload: record.payload_size(),
            });
        }
        if record.record_size() as u64 != u64::from(record.declared_size()) + RECORD_SIZE as u64 {
            return Err(MalformedResponse::RecordSizeMismatch {
                record: record.record_size(),
                declared: record.declared_size(),
            });
        }
        if record.format_version() != RECORD_VERSION {
            return Err(MalformedResponse::RecordVersion(record.format_version()));
        }

        let start = offset + RECORD_SIZE;
        let end = start + part.size as usize;
        let payload = body
            .get(start..end)
            .ok_or_else(|| MalformedResponse::TruncatedPayload {
                fingerprint: part.fingerprint.clone(),
            })?;

        // Verify content integrity before handing the bytes to the caller.
        if fingerprint(payload) != part.fingerprint {
            return Err(MalformedResponse::PayloadIntegrity {
                fingerprint: part.fingerprint.clone(),
            });
        }

        part.payload = Some(Bytes::copy_from_slice(payload));
        next_expected += 1;
        valid += 1;
    }

    Ok(valid)
}

/// Error text carried in a message body: bytes up to the first NUL,
/// lossily decoded.
fn message_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Error text attached after a failed record. Lenient: a bogus length on
/// an already-failed record yields empty text rather than another error.
fn per_part_error_text(body: &[u8], offset: usize, record: &PartRecord) -> String {
    let start = offset + RECORD_SIZE;
    let end = start.saturating_add(record.payload_size() as usize);
    body.get(start..end).map(message_text).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
