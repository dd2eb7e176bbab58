//! Pure SigV4 building blocks: canonical request, string-to-sign, signing
//! key, final signature. The middleware in [`crate::auth`] drives these;
//! nothing here touches I/O.

use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// The SigV4 scheme prefix on the `Authorization` header.
pub const SCHEME: &str = "AWS4-HMAC-SHA256";
/// The fixed terminator of a credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Percent-encoding policy: everything outside the unreserved set.
const SIGV4_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Like [`SIGV4_ENCODE`] but preserving path separators.
const SIGV4_ENCODE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, SIGV4_ENCODE).to_string()
}

/// The parsed pieces of one `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    /// The access-key ID from the credential scope.
    pub access_key_id: String,
    /// `YYYYMMDD`.
    pub date: String,
    /// The signing region.
    pub region: String,
    /// The signing service; selects the sub-dispatcher downstream.
    pub service: String,
    /// The semicolon-separated signed-header list, as sent.
    pub signed_headers: String,
    /// The hex signature, as sent.
    pub signature: String,
}

impl AuthHeader {
    /// The credential scope (`<date>/<region>/<service>/aws4_request`).
    pub fn scope(&self) -> String {
        format!(
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date, self.region, self.service
        )
    }

    /// Parses the header. Returns `None` on any structural violation:
    /// wrong scheme, a part count other than three, a credential scope
    /// without its five slash-separated fields, or a scope that does not
    /// end in the literal terminator.
    pub fn parse(header: &str) -> Option<AuthHeader> {
        let rest = header.strip_prefix(SCHEME)?.strip_prefix(' ')?;
        let parts: Vec<&str> = rest.split(", ").collect();
        if parts.len() != 3 {
            return None;
        }
        let credential = parts[0].strip_prefix("Credential=")?;
        let signed_headers = parts[1].strip_prefix("SignedHeaders=")?;
        let signature = parts[2].strip_prefix("Signature=")?;
        if signed_headers.is_empty() || signature.is_empty() {
            return None;
        }

        let fields: Vec<&str> = credential.split('/').collect();
        if fields.len() != 5 || fields[4] != SCOPE_TERMINATOR {
            return None;
        }
        Some(AuthHeader {
            access_key_id: fields[0].to_string(),
            date: fields[1].to_string(),
            region: fields[2].to_string(),
            service: fields[3].to_string(),
            signed_headers: signed_headers.to_string(),
            signature: signature.to_string(),
        })
    }
}

/// The canonical URI: the request path percent-encoded with slashes
/// preserved; empty means `/`.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    utf8_percent_encode(&decoded, SIGV4_ENCODE_PATH).to_string()
}

/// The canonical query string: pairs re-emitted with keys in lexical
/// order, values in lexical order within repeated keys, both sides
/// percent-encoded with the unreserved-set policy.
pub fn canonical_query_string(raw_query: &str) -> String {
    let mut pairs: Vec<(String, String)> = raw_query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (
                encode(&percent_decode_str(k).decode_utf8_lossy()),
                encode(&percent_decode_str(v).decode_utf8_lossy()),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical headers: exactly the signed-header list, lower-cased, values
/// whitespace-trimmed and space-collapsed, newline-terminated, in lexical
/// order. Returns the block and the normalised signed-header list.
pub fn canonical_headers<'a>(
    signed_headers: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> (String, String) {
    let mut names: Vec<String> = signed_headers
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    names.sort();
    let block: String = names
        .iter()
        .map(|name| {
            let value = lookup(name).unwrap_or("");
            let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{name}:{trimmed}\n")
        })
        .collect();
    (block, names.join(";"))
}

/// Hex SHA-256 of a payload.
pub fn payload_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Assembles the canonical request.
pub fn canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    headers_block: &str,
    signed_headers: &str,
    body_hash: &str,
) -> String {
    format!("{method}\n{uri}\n{query}\n{headers_block}\n{signed_headers}\n{body_hash}")
}

/// Assembles the string-to-sign.
pub fn string_to_sign(timestamp: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{SCHEME}\n{timestamp}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derives the signing key:
/// `HMAC(HMAC(HMAC(HMAC("AWS4"+secret, date), region), service), "aws4_request")`.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// The final hex signature.
pub fn sign(signing_key: &[u8], string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key, string_to_sign.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_header_parses_the_exact_shape() {
        let header = "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
                      SignedHeaders=host;x-amz-date, Signature=abc123";
        let parsed = AuthHeader::parse(header).unwrap();
        assert_eq!(parsed.access_key_id, "AKIDEXAMPLE");
        assert_eq!(parsed.date, "20150830");
        assert_eq!(parsed.region, "us-east-1");
        assert_eq!(parsed.service, "iam");
        assert_eq!(parsed.signed_headers, "host;x-amz-date");
        assert_eq!(parsed.signature, "abc123");
        assert_eq!(parsed.scope(), "20150830/us-east-1/iam/aws4_request");
    }

    #[test]
    fn auth_header_rejects_structural_violations() {
        // Wrong scheme.
        assert!(AuthHeader::parse("AWS3 Credential=a/b/c/d/aws4_request, SignedHeaders=h, Signature=s").is_none());
        // Two parts instead of three.
        assert!(AuthHeader::parse(
            "AWS4-HMAC-SHA256 Credential=a/b/c/d/aws4_request, Signature=s"
        )
        .is_none());
        // Four credential fields.
        assert!(AuthHeader::parse(
            "AWS4-HMAC-SHA256 Credential=a/b/c/aws4_request, SignedHeaders=h, Signature=s"
        )
        .is_none());
        // Scope terminator is not the literal.
        assert!(AuthHeader::parse(
            "AWS4-HMAC-SHA256 Credential=a/b/c/d/aws5_request, SignedHeaders=h, Signature=s"
        )
        .is_none());
    }

    #[test]
    fn canonical_uri_preserves_slashes_and_defaults_to_root() {
        assert_eq!(canonical_uri(""), "/");
        assert_eq!(canonical_uri("/"), "/");
        assert_eq!(canonical_uri("/a b/c"), "/a%20b/c");
        assert_eq!(canonical_uri("/a%20b/c"), "/a%20b/c");
    }

    #[test]
    fn canonical_query_sorts_keys_and_values() {
        assert_eq!(
            canonical_query_string("b=2&a=2&a=1&c"),
            "a=1&a=2&b=2&c="
        );
        assert_eq!(canonical_query_string("k=a%2Fb"), "k=a%2Fb");
        assert_eq!(canonical_query_string(""), "");
    }

    #[test]
    fn canonical_headers_are_lowercased_sorted_and_trimmed() {
        let (block, signed) = canonical_headers("X-Amz-Date;Host", |name| match name {
            "host" => Some("Example.amazonaws.com"),
            "x-amz-date" => Some("  20150830T123600Z  "),
            _ => None,
        });
        assert_eq!(
            block,
            "host:Example.amazonaws.com\nx-amz-date:20150830T123600Z\n"
        );
        assert_eq!(signed, "host;x-amz-date");
    }

    // The derived-key example from the AWS documentation.
    #[test]
    fn signing_key_matches_the_published_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    // The `get-vanilla` case of the AWS SigV4 test suite.
    #[test]
    fn get_vanilla_signature_matches_the_test_suite() {
        let (headers_block, signed) = canonical_headers("host;x-amz-date", |name| match name {
            "host" => Some("example.amazonaws.com"),
            "x-amz-date" => Some("20150830T123600Z"),
            _ => None,
        });
        let creq = canonical_request(
            "GET",
            &canonical_uri("/"),
            &canonical_query_string(""),
            &headers_block,
            &signed,
            &payload_hash(b""),
        );
        let sts = string_to_sign(
            "20150830T123600Z",
            "20150830/us-east-1/service/aws4_request",
            &creq,
        );
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "service",
        );
        assert_eq!(
            sign(&key, &sts),
            "5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }
}
