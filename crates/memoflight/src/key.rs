use std::cmp::Ordering;
use std::fmt::{self, Write};

use bytes::Bytes;
use sha2::{Digest, Sha256};

/// The canonical identity of a request.
///
/// A `CacheKey` owns the canonical payload bytes produced by a
/// [`KeyEncoder`](crate::KeyEncoder). The same bytes are handed to the
/// [`Transport`](crate::Transport), so two requests that encode identically
/// share both a store entry and a remote call.
///
/// Equality, ordering and hashing all use a SHA-256 fingerprint of the
/// payload, which also serves as the human-readable form of the key in logs.
#[derive(Debug, Clone, Eq)]
pub struct CacheKey {
    payload: Bytes,
    hash: [u8; 32],
}

impl CacheKey {
    /// Creates a key from canonical payload bytes.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let hash = Sha256::digest(&payload);
        // FIXME: `sha2` should really adopt const generics, this is such a pain right now
        let hash = <[u8; 32]>::try_from(hash).expect("sha256 outputs 32 bytes");

        CacheKey { payload, hash }
    }

    /// The canonical payload bytes, as sent to the transport.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The hex-formatted SHA-256 fingerprint of the payload.
    pub fn fingerprint(&self) -> String {
        let mut fingerprint = String::with_capacity(64);
        for b in &self.hash {
            fingerprint.write_fmt(format_args!("{b:02x}")).unwrap();
        }
        fingerprint
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialOrd for CacheKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CacheKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl std::hash::Hash for CacheKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}
