use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

use crate::Error;

/// Decode an ID token (JWT) and return the payload claims.
/// This does NOT verify the signature. Signature verification is
/// the application's responsibility.
pub fn decode_id_token(id_token: &str) -> Result<Map<String, Value>, Error> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or(Error::MissingField { field: "id_token" })?;

    // Strip any padding characters before decoding with URL_SAFE_NO_PAD
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| Error::MissingField { field: "id_token" })?;

    serde_json::from_slice(&decoded).map_err(|_| Error::MissingField { field: "id_token" })
}

/// Check the `nonce` claim of an ID token against the nonce recorded for
/// the authorization attempt.
pub fn verify_nonce(id_token: &str, expected: &str) -> Result<(), Error> {
    let claims = decode_id_token(id_token)?;
    match claims.get("nonce").and_then(Value::as_str) {
        Some(nonce) if nonce == expected => Ok(()),
        Some(_) => Err(Error::NonceMismatch),
        None => Err(Error::MissingField { field: "nonce" }),
    }
}
