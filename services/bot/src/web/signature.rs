//! services/bot/src/web/signature.rs
//!
//! HMAC-SHA256 signatures over raw webhook bodies, sent by the bridge as
//! `X-Signature-256: sha256=<hex digest>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature-256";
const SCHEME_PREFIX: &str = "sha256=";

/// Checks `header` against the body. A missing, malformed or wrong signature
/// all fail. The digest comparison is constant-time.
pub fn verify_signature(secret: &[u8], header: Option<&str>, body: &[u8]) -> bool {
    let Some(digest) = header.and_then(|h| h.trim().strip_prefix(SCHEME_PREFIX)) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// The header value the bridge sends for `body`.
#[cfg(test)]
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).unwrap();
    mac.update(body);
    format!("{SCHEME_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}
