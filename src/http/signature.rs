//! Request signatures.
//!
//! Signed requests carry an HTTP-signature style header set computed from the
//! method, path+query, body digest and a timestamp:
//!
//! ```text
//! (request-target): get /v3/accounts/GA..?include=balances
//! date: Tue, 14 Nov 2023 22:13:20 GMT
//! digest: SHA-256=<base64>            (only when a body is present)
//! ```
//!
//! The server rebuilds the same string from what it received, so the inputs
//! here must be exactly what the executor transmits.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha2::{Digest, Sha256};

use crate::api::error::{ApiError, ApiResult};
use crate::http::request::RequestDescriptor;
use crate::ledger::wallet::Keypair;

/// Algorithm label announced in the `signature` header.
pub const SIGNATURE_ALGORITHM: &str = "ecdsa-secp256k1-sha256";

pub const DATE_HEADER: &str = "date";
pub const DIGEST_HEADER: &str = "digest";
pub const SIGNATURE_HEADER: &str = "signature";
pub const ACCOUNT_ID_HEADER: &str = "account-id";

/// Return the descriptor's headers extended with signature headers.
///
/// `timestamp` is unix seconds, already corrected for clock skew.
pub fn sign_request(
    descriptor: &RequestDescriptor,
    keypair: &Keypair,
    account_id: &str,
    timestamp: i64,
) -> ApiResult<HeaderMap> {
    let date = http_date(timestamp)?;
    let digest = descriptor
        .body_bytes()?
        .map(|body| format!("SHA-256={}", STANDARD.encode(Sha256::digest(&body))));

    let signing_string = signing_string(descriptor, &date, digest.as_deref())?;
    let signature = keypair.sign(signing_string.as_bytes())?;

    let signed_headers = if digest.is_some() {
        "(request-target) date digest"
    } else {
        "(request-target) date"
    };
    let signature_header = format!(
        "keyId=\"{}\",algorithm=\"{}\",headers=\"{}\",signature=\"{}\"",
        keypair.public_id(),
        SIGNATURE_ALGORITHM,
        signed_headers,
        STANDARD.encode(signature.as_bytes())
    );

    let mut headers = descriptor.headers.clone();
    insert(&mut headers, DATE_HEADER, &date)?;
    if let Some(digest) = &digest {
        insert(&mut headers, DIGEST_HEADER, digest)?;
    }
    insert(&mut headers, ACCOUNT_ID_HEADER, account_id)?;
    insert(&mut headers, SIGNATURE_HEADER, &signature_header)?;

    Ok(headers)
}

/// The canonical string the signature covers.
pub fn signing_string(
    descriptor: &RequestDescriptor,
    date: &str,
    digest: Option<&str>,
) -> ApiResult<String> {
    let mut lines = vec![
        format!(
            "(request-target): {} {}",
            descriptor.method.as_str().to_lowercase(),
            descriptor.path_and_query()?
        ),
        format!("date: {}", date),
    ];
    if let Some(digest) = digest {
        lines.push(format!("digest: {}", digest));
    }
    Ok(lines.join("\n"))
}

/// Format unix seconds as an HTTP-date (RFC 7231, always GMT).
pub fn http_date(timestamp: i64) -> ApiResult<String> {
    let time = chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| ApiError::Precondition(format!("timestamp {} out of range", timestamp)))?;
    Ok(time.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> ApiResult<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::Precondition(format!("invalid value for header {}", name)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
