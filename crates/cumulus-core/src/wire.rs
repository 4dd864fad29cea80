//! Cumulus wire format — framing for the binary parts protocol.
//!
//! These types ARE the protocol. Every field, every size, every reserved
//! word is part of the wire format and must match what the cloud speaks.
//! All multi-byte integers travel in network byte order, expressed here as
//! `U32<BigEndian>` fields so a decoded struct is always read and written
//! through explicit byte-order conversions — never through host-order
//! layout assumptions.
//!
//! All types are #[repr(C, packed)] for deterministic layout and use
//! zerocopy derives for safe, allocation-free serialization. There is no
//! unsafe code in this module.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

type Be32 = U32<BigEndian>;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Magic constant opening every parts message.
pub const HEADER_SIGNATURE: u32 = 0xBA5E_BA11;

/// Magic constant opening every part record within a message body.
/// Distinct from the header magic so corruption is detectable at both the
/// message and the record boundary.
pub const RECORD_SIGNATURE: u32 = 0xCAB0_05E5;

/// Current header format version. A reply carrying any other version is
/// rejected as malformed.
pub const HEADER_VERSION: u32 = 1;

/// Current record format version.
pub const RECORD_VERSION: u32 = 1;

/// Wire size of [`PartsHeader`].
pub const HEADER_SIZE: usize = std::mem::size_of::<PartsHeader>();

/// Wire size of the fixed portion of [`PartRecord`], excluding any
/// trailing payload bytes.
pub const RECORD_SIZE: usize = std::mem::size_of::<PartRecord>();

/// Size of the NUL-terminated fingerprint field: 72 hex characters
/// (MD5 + SHA-1) plus the terminator.
pub const FINGERPRINT_FIELD_LEN: usize = 73;

/// Byte offset of `record_size` within [`PartRecord`] — the field the
/// record scanner reads to frame variable-length records.
pub const RECORD_SIZE_FIELD_OFFSET: usize = 4;

// ── Parts Header ──────────────────────────────────────────────────────────────

/// One per binary message, request or reply.
///
/// `error_code` is message-level: nonzero means the whole exchange failed
/// and the body carries a human-readable error string instead of records.
///
/// Wire size: 24 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes, Unaligned)]
#[repr(C, packed)]
pub struct PartsHeader {
    pub signature: Be32,
    /// Size of this structure as compiled by the sender. A mismatch means
    /// the two sides were built against different format revisions and the
    /// message is rejected. Not a variable-length field.
    pub header_size: Be32,
    pub format_version: Be32,
    /// Byte length of all records following the header.
    pub body_size: Be32,
    /// Number of part records encoded in the body.
    pub record_count: Be32,
    pub error_code: Be32,
}

// Compile-time size guard. If this fails, the wire format has silently changed.
assert_eq_size!(PartsHeader, [u8; 24]);

impl PartsHeader {
    /// A well-formed request/reply header covering `record_count` records
    /// in a `body_size`-byte body.
    pub fn new(body_size: u32, record_count: u32) -> Self {
        Self {
            signature: Be32::new(HEADER_SIGNATURE),
            header_size: Be32::new(HEADER_SIZE as u32),
            format_version: Be32::new(HEADER_VERSION),
            body_size: Be32::new(body_size),
            record_count: Be32::new(record_count),
            error_code: Be32::new(0),
        }
    }

    pub fn signature(&self) -> u32 {
        let v = self.signature;
        v.get()
    }

    pub fn header_size(&self) -> u32 {
        let v = self.header_size;
        v.get()
    }

    pub fn format_version(&self) -> u32 {
        let v = self.format_version;
        v.get()
    }

    pub fn body_size(&self) -> u32 {
        let v = self.body_size;
        v.get()
    }

    pub fn record_count(&self) -> u32 {
        let v = self.record_count;
        v.get()
    }

    pub fn error_code(&self) -> u32 {
        let v = self.error_code;
        v.get()
    }
}

// ── Part Record ───────────────────────────────────────────────────────────────

/// One per part within a message body. Fixed layout; total on-wire size is
/// `record_size` = 105 bytes + trailing payload.
///
/// `error_code` is part-level: nonzero means this individual part failed
/// (e.g. not found) and any bytes following the record are UTF-8 error
/// text rather than part content.
///
/// Wire size (fixed portion): 105 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes, Unaligned)]
#[repr(C, packed)]
pub struct PartRecord {
    pub signature: Be32,
    /// Total byte length of this record including any trailing payload.
    /// The scanner reads this field to locate the next record.
    pub record_size: Be32,
    pub format_version: Be32,
    /// Share context tag, carried through for server-side authorization
    /// re-checks. Zero outside shares.
    pub share_id: Be32,
    /// NUL-terminated content fingerprint, 72 hex characters.
    pub fingerprint: [u8; FINGERPRINT_FIELD_LEN],
    /// Size of the part's logical content.
    pub declared_size: Be32,
    /// Bytes actually attached after this record. Zero for a pure
    /// presence check.
    pub payload_size: Be32,
    pub error_code: Be32,
    pub reserved: Be32,
}

assert_eq_size!(PartRecord, [u8; 105]);

impl PartRecord {
    /// A well-formed outgoing record for `fingerprint` with
    /// `payload_size` bytes of content attached.
    ///
    /// `fingerprint` must fit the wire field with its terminator; callers
    /// validate length before packing.
    pub fn new(share_id: u32, fingerprint: &str, declared_size: u32, payload_size: u32) -> Self {
        let mut fp = [0u8; FINGERPRINT_FIELD_LEN];
        fp[..fingerprint.len()].copy_from_slice(fingerprint.as_bytes());
        Self {
            signature: Be32::new(RECORD_SIGNATURE),
            record_size: Be32::new((RECORD_SIZE as u32) + payload_size),
            format_version: Be32::new(RECORD_VERSION),
            share_id: Be32::new(share_id),
            fingerprint: fp,
            declared_size: Be32::new(declared_size),
            payload_size: Be32::new(payload_size),
            error_code: Be32::new(0),
            reserved: Be32::new(0),
        }
    }

    pub fn signature(&self) -> u32 {
        let v = self.signature;
        v.get()
    }

    pub fn record_size(&self) -> u32 {
        let v = self.record_size;
        v.get()
    }

    pub fn format_version(&self) -> u32 {
        let v = self.format_version;
        v.get()
    }

    pub fn share_id(&self) -> u32 {
        let v = self.share_id;
        v.get()
    }

    pub fn declared_size(&self) -> u32 {
        let v = self.declared_size;
        v.get()
    }

    pub fn payload_size(&self) -> u32 {
        let v = self.payload_size;
        v.get()
    }

    pub fn error_code(&self) -> u32 {
        let v = self.error_code;
        v.get()
    }

    /// Fingerprint bytes up to the NUL terminator.
    pub fn fingerprint_bytes(&self) -> [u8; FINGERPRINT_FIELD_LEN] {
        self.fingerprint
    }

    /// Fingerprint as text, lossily decoded.
    pub fn fingerprint_text(&self) -> String {
        let raw = self.fingerprint;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    /// Whether the wire fingerprint matches `fingerprint` exactly.
    pub fn fingerprint_matches(&self, fingerprint: &str) -> bool {
        let raw = self.fingerprint;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        &raw[..end] == fingerprint.as_bytes()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
