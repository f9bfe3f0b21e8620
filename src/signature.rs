//! Request and delivery URL signing
//!
//! Delivery URLs carry `s--XXXXXXXX--`, the first 8 characters of
//! ```text
//! base64url(SHA1(to_sign + api_secret))
//! ```
//! API requests carry a hex digest of the sorted `key=value` parameters
//! joined by `&` with the secret appended.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::network::RequestParams;

/// Length of the signature component embedded in delivery URLs
pub const DELIVERY_SIGNATURE_LENGTH: usize = 8;

/// Parameters never included in an API request signature
const UNSIGNED_PARAMS: &[&str] = &["file", "api_key", "resource_type", "cloud_name", "signature"];

/// Digest used for API request signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// Full URL-safe base64 SHA-1 digest of `payload + secret`
pub fn sign(payload: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    URL_SAFE.encode(hasher.finalize())
}

/// The `s--XXXXXXXX--` path component for a delivery URL
pub fn delivery_signature(to_sign: &str, secret: &str) -> String {
    let digest = sign(to_sign, secret);
    format!("s--{}--", &digest[..DELIVERY_SIGNATURE_LENGTH])
}

/// The string an API request signature is computed over (without secret)
pub fn api_string_to_sign(params: &RequestParams) -> String {
    params
        .iter()
        .filter(|(name, value)| !UNSIGNED_PARAMS.contains(&name.as_str()) && !value.is_empty())
        .map(|(name, value)| format!("{}={}", name, value.to_sign_value()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex digest of the sorted request parameters with the secret appended
pub fn api_sign_request(
    params: &RequestParams,
    secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = api_string_to_sign(params);
    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(to_sign.as_bytes());
            hasher.update(secret.as_bytes());
            hex::encode(hasher.finalize())
        }
        SignatureAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(to_sign.as_bytes());
            hasher.update(secret.as_bytes());
            hex::encode(hasher.finalize())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RequestParam;

    #[test]
    fn test_delivery_signature_known_vector() {
        assert_eq!(
            delivery_signature("c_crop,h_20,w_10/image.jpg", "b"),
            "s--Ai4Znfl3--"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        assert_eq!(sign("sample", "secret"), sign("sample", "secret"));
    }

    #[test]
    fn test_changing_secret_changes_signature() {
        assert_ne!(
            delivery_signature("sample", "secret-one"),
            delivery_signature("sample", "secret-two")
        );
    }

    #[test]
    fn test_signature_uses_url_safe_alphabet() {
        for payload in ["a", "b", "c", "sample", "folder/image.jpg", "w_100/x"] {
            let digest = sign(payload, "s");
            assert!(!digest.contains('+') && !digest.contains('/'));
        }
    }

    fn params(pairs: &[(&str, RequestParam)]) -> RequestParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_api_string_to_sign_sorts_and_filters() {
        let params = params(&[
            ("timestamp", RequestParam::Text("1315060510".into())),
            ("public_id", RequestParam::Text("sample".into())),
            ("api_key", RequestParam::Text("1234".into())),
            ("file", RequestParam::Text("http://x".into())),
            ("folder", RequestParam::Text(String::new())),
            ("tags", RequestParam::List(vec!["a".into(), "b".into()])),
        ]);
        assert_eq!(
            api_string_to_sign(&params),
            "public_id=sample&tags=a,b&timestamp=1315060510"
        );
    }

    #[test]
    fn test_api_sign_request_sha1_known_vector() {
        let params = params(&[
            ("public_id", RequestParam::Text("sample_image".into())),
            ("timestamp", RequestParam::Text("1315060510".into())),
        ]);
        assert_eq!(
            api_sign_request(&params, "abcd", SignatureAlgorithm::Sha1),
            "b4ad47fb4e25c7bf5f92a20089f9db59bc302313"
        );
    }

    #[test]
    fn test_api_sign_request_sha256_is_longer() {
        let params = params(&[("timestamp", RequestParam::Text("1".into()))]);
        assert_eq!(api_sign_request(&params, "abcd", SignatureAlgorithm::Sha256).len(), 64);
        assert_eq!(api_sign_request(&params, "abcd", SignatureAlgorithm::Sha1).len(), 40);
    }
}
