use crate::error::AnchorError;

/// The ASCII blob carried inside a ledger transaction, referencing the
/// off-chain core index file for a batch: `"{numberOfOperations}.{coreIndexFileHash}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorString {
    pub number_of_operations: u32,
    pub core_index_file_hash: String,
}

impl AnchorString {
    pub fn new(number_of_operations: u32, core_index_file_hash: impl Into<String>) -> Self {
        Self { number_of_operations, core_index_file_hash: core_index_file_hash.into() }
    }

    pub fn serialize(&self) -> String {
        format!("{}.{}", self.number_of_operations, self.core_index_file_hash)
    }

    /// Parse `"{numberOfOperations}.{coreIndexFileHash}"`. The operations
    /// count must be a non-negative base-10 integer; the hash must be a
    /// non-empty base-encoded multihash (validated for charset only here —
    /// structural multihash validity is checked by the CAS layer on fetch).
    pub fn parse(s: &str) -> Result<Self, AnchorError> {
        let (count_str, hash_str) = s
            .split_once('.')
            .ok_or_else(|| AnchorError::permanent(format!("malformed anchor string: {s}")))?;

        if count_str.is_empty() || !count_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnchorError::permanent(format!(
                "anchor string operation count is not a non-negative base-10 integer: {count_str}"
            )));
        }
        let number_of_operations: u32 = count_str
            .parse()
            .map_err(|e| AnchorError::permanent(format!("operation count overflow: {e}")))?;

        if hash_str.is_empty() || !hash_str.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(AnchorError::permanent(format!(
                "anchor string hash is not a base-encoded multihash: {hash_str}"
            )));
        }

        Ok(Self { number_of_operations, core_index_file_hash: hash_str.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let original = AnchorString::new(3, "QmXyz123");
        let parsed = AnchorString::parse(&original.serialize()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(AnchorString::parse("nodothere").is_err());
    }

    #[test]
    fn rejects_negative_or_non_numeric_count() {
        assert!(AnchorString::parse("-1.QmXyz").is_err());
        assert!(AnchorString::parse("abc.QmXyz").is_err());
    }

    #[test]
    fn rejects_empty_hash() {
        assert!(AnchorString::parse("3.").is_err());
    }
}
