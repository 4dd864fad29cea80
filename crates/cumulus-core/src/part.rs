//! Part descriptors — content-addressed chunks of a file.

use bytes::Bytes;

use crate::fingerprint::fingerprint;

/// One chunk of a file, identified by its content fingerprint.
///
/// `offset` locates the chunk within its parent file and is never
/// transmitted in the binary payload — callers use it to reassemble
/// downloads. `payload` is present when sending data up or after a
/// successful download, and is released as soon as a batch has been
/// transmitted or consumed to bound memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartDescriptor {
    pub fingerprint: String,
    pub size: u32,
    pub offset: u64,
    pub payload: Option<Bytes>,
}

impl PartDescriptor {
    /// Build a descriptor from chunk content at `offset`, computing its
    /// fingerprint and size.
    pub fn from_content(offset: u64, content: impl Into<Bytes>) -> Self {
        let payload: Bytes = content.into();
        Self {
            fingerprint: fingerprint(&payload),
            size: payload.len() as u32,
            offset,
            payload: Some(payload),
        }
    }

    /// Drop the payload, keeping the identifying fields.
    pub fn release_payload(&mut self) {
        self.payload = None;
    }
}
