// # Request signing for the alidns RPC API
//
// Signature version 1.0: every parameter is percent-encoded per RFC 3986,
// sorted by key, joined into a canonical query, combined with the HTTP
// method into a string-to-sign, and HMAC-SHA1'd with `<secret>&` as the
// key. The base64 digest travels as the `Signature` query parameter.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use std::collections::BTreeMap;

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
/// Space must become %20 (not '+') and '*' must become %2A, which this set
/// already guarantees.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode one key or value the way the signer expects
pub(crate) fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, ENCODE_SET).to_string()
}

/// Sorted `k=v&k=v` canonical query over the encoded parameters
pub(crate) fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the request signature over method + canonical query
pub(crate) fn sign(
    method: &str,
    params: &BTreeMap<String, String>,
    access_key_secret: &str,
) -> String {
    let string_to_sign = format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(format!("{}&", access_key_secret).as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_characters_stay_literal() {
        assert_eq!(percent_encode("abcXYZ019-_.~"), "abcXYZ019-_.~");
    }

    #[test]
    fn reserved_characters_are_encoded() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("a*b"), "a%2Ab");
        assert_eq!(percent_encode("a/b=c&d"), "a%2Fb%3Dc%26d");
        assert_eq!(percent_encode("example.com"), "example.com");
    }

    #[test]
    fn canonical_query_is_sorted_by_key() {
        let mut params = BTreeMap::new();
        params.insert("Zebra".to_string(), "1".to_string());
        params.insert("Action".to_string(), "DescribeDomains".to_string());
        params.insert("Format".to_string(), "JSON".to_string());

        assert_eq!(
            canonical_query(&params),
            "Action=DescribeDomains&Format=JSON&Zebra=1"
        );
    }

    #[test]
    fn signature_is_deterministic_base64_of_sha1_digest() {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), "DescribeDomains".to_string());
        params.insert("Version".to_string(), "2015-01-09".to_string());

        let first = sign("GET", &params, "secret");
        let second = sign("GET", &params, "secret");
        assert_eq!(first, second);

        // HMAC-SHA1 digests are 20 bytes -> 28 base64 characters
        assert_eq!(first.len(), 28);

        // Any input change must change the signature
        assert_ne!(first, sign("POST", &params, "secret"));
        assert_ne!(first, sign("GET", &params, "other-secret"));
        params.insert("Extra".to_string(), "x".to_string());
        assert_ne!(first, sign("GET", &params, "secret"));
    }
}
