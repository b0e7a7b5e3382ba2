//! Identity derivation and payload digests
//!
//! Tool identifiers are a pure function of `(name, version, provider_id)`.
//! Re-deriving from the same triple always yields the same DID, which is what
//! makes a retried registration detectable as a duplicate instead of creating
//! a second record.

use sha2::{Digest, Sha256};

/// Prefix of every derived tool DID
pub const TOOL_DID_PREFIX: &str = "did:claw:tool:";

/// Prefix of every payload digest
pub const DIGEST_PREFIX: &str = "sha256:";

/// Derive the tool DID for a `(name, version, provider_id)` triple.
pub fn tool_did(name: &str, version: &str, provider_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"@");
    hasher.update(version.as_bytes());
    hasher.update(b"#");
    hasher.update(provider_id.as_bytes());
    let hash = hasher.finalize();
    format!("{}{}", TOOL_DID_PREFIX, hex::encode(&hash[..16]))
}

/// Digest of a JSON payload, as stored in the invocation audit trail.
///
/// The digest covers serde_json's compact serialization. It is an opaque
/// audit token, not a canonical hash across serializers.
pub fn payload_digest(payload: &serde_json::Value) -> String {
    let hash = Sha256::digest(payload.to_string().as_bytes());
    format!("{}{}", DIGEST_PREFIX, hex::encode(hash))
}
