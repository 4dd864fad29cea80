//! cumulus-core — part types, content fingerprints, and the binary parts
//! wire protocol. All other Cumulus crates depend on this one.

pub mod codec;
pub mod fingerprint;
pub mod part;
pub mod scanner;
pub mod wire;

pub use codec::{pack_parts, parse_parts_reply, MalformedResponse, PackedParts};
pub use fingerprint::fingerprint;
pub use part::PartDescriptor;
