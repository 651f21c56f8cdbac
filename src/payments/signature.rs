use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a provider webhook signature header of the form
/// `t=<unix timestamp>,v1=<hex digest>` against the raw payload bytes.
///
/// The digest is HMAC-SHA256 of `"<timestamp>.<payload>"` keyed with the
/// shared endpoint secret. Comparison happens through `Mac::verify_slice`,
/// which is constant-time.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> bool {
    let Some((timestamp, provided)) = parse_signature_header(header) else {
        return false;
    };

    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

fn parse_signature_header(header: &str) -> Option<(&str, &str)> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }
    Some((timestamp?, signature?))
}

/// Produce a header the way the provider would sign a delivery. Used by the
/// test suite to forge valid deliveries.
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={digest}")
}
