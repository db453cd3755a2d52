//! Address extraction and canonicalization.
//!
//! Tokens arrive from untrusted text: blocklist lines, CSV columns, feed
//! entry bodies. Everything funnels through [`canonicalize_address`], which
//! either yields the canonical textual form of a valid IPv4/IPv6 address or
//! rejects the token. Rejections are silent by design: malformed tokens are
//! high volume and low value.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// Dotted-quad candidates inside free-form text. Validation happens after
/// the scan; the pattern is deliberately loose.
static IPV4_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("static IPv4 pattern must compile")
});

/// Validates a token and returns the canonical address string.
///
/// Accepts IPv4 dotted-quad and IPv6 literals. Out-of-range octets,
/// leading-zero octets, CSV header artifacts, and anything else the
/// standard parser rejects all return `None`.
pub fn canonicalize_address(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    token.parse::<IpAddr>().ok().map(|addr| addr.to_string())
}

/// Scans free-form text for valid IPv4 addresses.
///
/// Returns a set: duplicates within one source read collapse here, before
/// anything reaches the merge engine.
pub fn extract_ipv4_addresses(text: &str) -> BTreeSet<String> {
    let mut addresses = BTreeSet::new();
    for token in IPV4_TOKEN_RE.find_iter(text) {
        if let Some(canonical) = canonicalize_address(token.as_str()) {
            addresses.insert(canonical);
        }
    }
    addresses
}

/// Splits a list-file line into an address token and an optional raw score.
///
/// Lines are `address` or `address,score`; blank lines and `#` comments
/// yield `None`. The address token is not validated here.
pub fn parse_list_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split(',');
    let address = fields.next()?.trim();
    if address.is_empty() {
        return None;
    }
    let score = fields.next().map(str::trim).filter(|s| !s.is_empty());
    Some((address, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_valid_ipv4() {
        assert_eq!(
            canonicalize_address("203.0.113.5"),
            Some("203.0.113.5".to_string())
        );
        assert_eq!(canonicalize_address("0.0.0.0"), Some("0.0.0.0".to_string()));
        assert_eq!(
            canonicalize_address("255.255.255.255"),
            Some("255.255.255.255".to_string())
        );
    }

    #[test]
    fn test_canonical_form_round_trips() {
        // A valid address passed through validation yields itself.
        for addr in ["198.51.100.23", "8.8.8.8", "10.0.0.1"] {
            assert_eq!(canonicalize_address(addr).as_deref(), Some(addr));
        }
    }

    #[test]
    fn test_rejects_out_of_range_octets() {
        assert_eq!(canonicalize_address("999.999.999.999"), None);
        assert_eq!(canonicalize_address("256.1.1.1"), None);
        assert_eq!(canonicalize_address("1.2.3.300"), None);
    }

    #[test]
    fn test_rejects_structural_garbage() {
        assert_eq!(canonicalize_address("1.2.3"), None);
        assert_eq!(canonicalize_address("1.2.3.4.5"), None);
        assert_eq!(canonicalize_address("ip"), None);
        assert_eq!(canonicalize_address("address"), None);
        assert_eq!(canonicalize_address(""), None);
        assert_eq!(canonicalize_address("not.an.ip.addr"), None);
    }

    #[test]
    fn test_rejects_leading_zero_octets() {
        // The standard parser treats leading zeros as malformed, which
        // avoids octal ambiguity.
        assert_eq!(canonicalize_address("01.2.3.4"), None);
    }

    #[test]
    fn test_accepts_and_compresses_ipv6() {
        assert_eq!(
            canonicalize_address("2001:0db8:0000:0000:0000:0000:0000:0001"),
            Some("2001:db8::1".to_string())
        );
        assert_eq!(canonicalize_address("::1"), Some("::1".to_string()));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(
            canonicalize_address("  192.0.2.7  "),
            Some("192.0.2.7".to_string())
        );
    }

    #[test]
    fn test_extract_finds_addresses_in_text() {
        let text = "Blocked 203.0.113.5 and 198.51.100.7; ignore 999.999.999.999 and 1.2.3";
        let found = extract_ipv4_addresses(text);
        assert_eq!(found.len(), 2);
        assert!(found.contains("203.0.113.5"));
        assert!(found.contains("198.51.100.7"));
    }

    #[test]
    fn test_extract_deduplicates_within_text() {
        let text = "203.0.113.5 203.0.113.5 203.0.113.5";
        let found = extract_ipv4_addresses(text);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_ipv4_addresses("").is_empty());
    }

    #[test]
    fn test_parse_list_line_variants() {
        assert_eq!(parse_list_line("1.2.3.4"), Some(("1.2.3.4", None)));
        assert_eq!(parse_list_line("1.2.3.4,17"), Some(("1.2.3.4", Some("17"))));
        assert_eq!(parse_list_line("1.2.3.4, 17 "), Some(("1.2.3.4", Some("17"))));
        assert_eq!(parse_list_line("1.2.3.4,"), Some(("1.2.3.4", None)));
        assert_eq!(parse_list_line(""), None);
        assert_eq!(parse_list_line("   "), None);
        assert_eq!(parse_list_line("# comment"), None);
    }
}
