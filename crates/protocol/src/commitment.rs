use sha2::{Digest, Sha256};

/// Compute the multihash-style commitment value for a reveal value. A real
/// multihash would prefix the digest with an algorithm/length tag (see
/// `VersionMetadata::hash_algorithm_code`); this is the function both the
/// operation issuer (off anchor-protocol's scope) and the resolver must
/// agree on to make commit/reveal matching work.
pub fn commitment_hash(reveal_value: &[u8]) -> String {
    hex::encode(Sha256::digest(reveal_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        assert_eq!(commitment_hash(b"secret"), commitment_hash(b"secret"));
        assert_ne!(commitment_hash(b"secret"), commitment_hash(b"other"));
    }
}
