use kedge_core::ProtocolError;
use kedge_crypto::multihash;

/// The decoded form of the on-ledger anchor string:
/// `<number_of_operations>.<anchor_file_uri>`.
///
/// The separator can never collide with either side: the count is a bare
/// decimal and the URI is base64url, which contains no '.'.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchoredData {
    pub number_of_operations: u64,
    pub anchor_file_uri: String,
}

impl AnchoredData {
    /// Strict parse of an anchor string read off the ledger.
    pub fn parse(anchor_string: &str) -> Result<Self, ProtocolError> {
        let parts: Vec<&str> = anchor_string.split('.').collect();
        let [count, uri] = parts.as_slice() else {
            return Err(ProtocolError::AnchorStringMalformed);
        };

        // No signs, no leading zeros: exactly the canonical decimal form.
        if count.is_empty()
            || !count.bytes().all(|b| b.is_ascii_digit())
            || (count.len() > 1 && count.starts_with('0'))
        {
            return Err(ProtocolError::AnchorStringOperationCountInvalid);
        }
        let number_of_operations: u64 = count
            .parse()
            .map_err(|_| ProtocolError::AnchorStringOperationCountInvalid)?;
        if number_of_operations == 0 {
            return Err(ProtocolError::AnchorStringOperationCountInvalid);
        }

        if !multihash::is_valid_encoded_multihash(uri) {
            return Err(ProtocolError::AnchorStringMalformed);
        }

        Ok(Self { number_of_operations, anchor_file_uri: uri.to_string() })
    }

    /// Encode for ledger publication.
    pub fn to_anchor_string(&self) -> String {
        format!("{}.{}", self.number_of_operations, self.anchor_file_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri() -> String {
        multihash::canonicalize_then_hash_then_encode(&json!({"file": "anchor"})).unwrap()
    }

    #[test]
    fn round_trip() {
        let data = AnchoredData { number_of_operations: 42, anchor_file_uri: uri() };
        assert_eq!(AnchoredData::parse(&data.to_anchor_string()).unwrap(), data);
    }

    #[test]
    fn rejects_wrong_part_count() {
        assert!(AnchoredData::parse("42").is_err());
        assert!(AnchoredData::parse(&format!("1.{}.extra", uri())).is_err());
        assert!(AnchoredData::parse("").is_err());
    }

    #[test]
    fn rejects_non_canonical_counts() {
        let uri = uri();
        for count in ["0", "01", "+1", "-1", "1e3", ""] {
            assert!(
                AnchoredData::parse(&format!("{count}.{uri}")).is_err(),
                "count {count:?} must be rejected"
            );
        }
    }

    #[test]
    fn rejects_invalid_uri() {
        assert_eq!(
            AnchoredData::parse("5.not-a-multihash").unwrap_err(),
            ProtocolError::AnchorStringMalformed
        );
    }
}
