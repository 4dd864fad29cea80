//! Client error taxonomy.

use cumulus_core::MalformedResponse;
use thiserror::Error;

use crate::transport::TransportError;

/// Server-defined part-not-found code, also reported per record in
/// binary replies.
pub const PART_NOT_FOUND_CODE: u32 = 1600;

/// Named kinds for the cloud's numeric business error codes.
///
/// The table is fixed; any code the client does not know maps to
/// [`ErrorKind::ResponseFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IncorrectLoginCredentials,
    UserEmailNotVerified,
    EmailAlreadyExists,
    NoSuchEmail,
    ObjectMissing,
    InvalidPeerSyncToken,
    InvalidListWatermark,
    ShareJoinDenied,
    ShareMissing,
    ShareAlreadyExists,
    PartNotFound,
    ResponseFailure,
}

impl ErrorKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1008 => ErrorKind::IncorrectLoginCredentials,
            1009 => ErrorKind::UserEmailNotVerified,
            1010 => ErrorKind::EmailAlreadyExists,
            1017 => ErrorKind::NoSuchEmail,
            1021 => ErrorKind::ObjectMissing,
            1029 => ErrorKind::InvalidPeerSyncToken,
            1030 => ErrorKind::InvalidListWatermark,
            1031 => ErrorKind::ShareJoinDenied,
            1034 => ErrorKind::ShareMissing,
            8001 => ErrorKind::ShareAlreadyExists,
            PART_NOT_FOUND_CODE => ErrorKind::PartNotFound,
            _ => ErrorKind::ResponseFailure,
        }
    }
}

/// Everything a client operation can fail with.
///
/// `Cloud` messages come from the server and are meant to be surfaced
/// verbatim; `Malformed` indicates protocol skew and is not retryable
/// without a software update.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid JSON-RPC envelope: {0}")]
    Protocol(String),

    #[error(transparent)]
    Malformed(#[from] MalformedResponse),

    #[error("cloud error {kind:?} (code {code}): {message}")]
    Cloud {
        kind: ErrorKind,
        code: u32,
        message: String,
    },
}
