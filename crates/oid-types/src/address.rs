//! Address normalization utilities.
//!
//! This module is the canonical source for address normalization in the
//! workspace. Ledger addresses are 32-byte values that appear in several
//! textual forms:
//! - Short form: "0x2"
//! - Full form: "0x0000...0002" (64 hex chars)
//! - Without prefix: "2"
//!
//! All on-chain address comparisons (capability matching, config filtering)
//! are performed on the normalized full form.

/// Normalize an address to lowercase with 0x prefix and full 64 hex characters.
///
/// This is the canonical address format for internal use and comparisons.
///
/// # Examples
///
/// ```
/// use oid_types::address::normalize_address;
///
/// assert_eq!(
///     normalize_address("0x2"),
///     "0x0000000000000000000000000000000000000000000000000000000000000002"
/// );
/// assert_eq!(
///     normalize_address("ABC"),
///     "0x0000000000000000000000000000000000000000000000000000000000000abc"
/// );
/// ```
pub fn normalize_address(addr: &str) -> String {
    let addr = addr.trim();
    let hex = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr)
        .to_lowercase();
    if hex.len() < 64 {
        format!("0x{:0>64}", hex)
    } else {
        // Truncate on a char boundary: the input is caller-supplied and may
        // not be pure hex, so byte 64 can fall inside a multi-byte char.
        let end = hex
            .char_indices()
            .nth(64)
            .map(|(i, _)| i)
            .unwrap_or(hex.len());
        format!("0x{}", &hex[..end])
    }
}

/// Normalize an address to short form (minimal hex digits).
///
/// Useful for display purposes.
///
/// # Examples
///
/// ```
/// use oid_types::address::normalize_address_short;
///
/// assert_eq!(
///     normalize_address_short("0x0000000000000000000000000000000000000000000000000000000000000002"),
///     "0x2"
/// );
/// ```
pub fn normalize_address_short(addr: &str) -> String {
    let normalized = normalize_address(addr);
    let hex = normalized.strip_prefix("0x").unwrap_or(&normalized);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Check whether two address strings denote the same 32-byte value,
/// regardless of form.
pub fn addresses_equal(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Extract the trailing segment of a decentralized identifier.
///
/// A DID like `did:oid:testnet:0xabc` identifies its subject by the final
/// `:`-separated segment; that segment is what capability objects record in
/// their `controller_of` field.
///
/// # Examples
///
/// ```
/// use oid_types::address::did_trailing_segment;
///
/// assert_eq!(did_trailing_segment("did:oid:testnet:0xabc"), "0xabc");
/// assert_eq!(did_trailing_segment("0xabc"), "0xabc");
/// ```
pub fn did_trailing_segment(identity: &str) -> &str {
    identity.rsplit(':').next().unwrap_or(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("0xABC"),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
        assert_eq!(
            normalize_address("ABC"),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
        assert_eq!(
            normalize_address("  0x2  "),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
        // Uppercase 0X prefix
        assert_eq!(
            normalize_address("0XABC"),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
    }

    #[test]
    fn test_normalize_address_short() {
        assert_eq!(normalize_address_short("0x2"), "0x2");
        assert_eq!(
            normalize_address_short(
                "0x0000000000000000000000000000000000000000000000000000000000000002"
            ),
            "0x2"
        );
        assert_eq!(normalize_address_short("0x00abc"), "0xabc");
        assert_eq!(normalize_address_short("0x0"), "0x0");
    }

    #[test]
    fn test_non_hex_input_does_not_panic() {
        // A multi-byte char straddling byte 64 must not split the string
        // mid-char; such input simply compares unequal to real addresses.
        let odd = format!("{}ébcd", "a".repeat(63));
        assert!(!addresses_equal(&odd, "0xabc"));
        assert!(normalize_address(&odd).starts_with("0x"));

        // Exactly 64 bytes ending mid-char.
        let edge = format!("{}é", "a".repeat(63));
        assert!(!addresses_equal(&edge, "0xabc"));
    }

    #[test]
    fn test_addresses_equal() {
        assert!(addresses_equal("0x2", "0x02"));
        assert!(addresses_equal(
            "0x2",
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        ));
        assert!(!addresses_equal("0x2", "0x3"));
    }

    #[test]
    fn test_did_trailing_segment() {
        assert_eq!(did_trailing_segment("did:oid:testnet:0xabc"), "0xabc");
        assert_eq!(did_trailing_segment("did:oid:0x123"), "0x123");
        assert_eq!(did_trailing_segment("0xplain"), "0xplain");
        assert_eq!(did_trailing_segment(""), "");
    }
}
