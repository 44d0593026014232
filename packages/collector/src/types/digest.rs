//! Content digests - the identity of a payload.

use sha2::{Digest as _, Sha256};
use std::fmt;

/// SHA-256 fingerprint of a byte sequence.
///
/// Used as the content cache key. Two payloads with the same bytes always
/// share a digest; distinct payloads never collide in practice.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Calculate the digest of `bytes`.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_ref());
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix keeps log lines readable
        write!(f, "Digest({})", &self.to_hex()[..12])
    }
}

/// Hash arbitrary bytes. Shorthand for [`Digest::of`].
pub fn hash(bytes: impl AsRef<[u8]>) -> Digest {
    Digest::of(bytes)
}
