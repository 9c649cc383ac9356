//! AWS Signature Version 4 for Route53 requests
//!
//! Route53 is a global service: the credential scope always names
//! `us-east-1`, wherever the hosted zone lives. Only three headers are
//! signed, in this fixed order: `content-type`, `host`, `x-amz-date`.
//!
//! Every function here is pure; the request time is an input so signatures
//! can be reproduced exactly.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Region used in every Route53 credential scope
pub const REGION: &str = "us-east-1";

/// Service name used in the credential scope
pub const SERVICE: &str = "route53";

/// Signed header list, lower-cased and in canonical order
pub const SIGNED_HEADERS: &str = "content-type;host;x-amz-date";

/// Content type of every change request
pub const CONTENT_TYPE: &str = "text/xml";

/// Long-term credentials used to derive per-request signing keys
#[derive(Clone)]
pub struct SigningCredentials {
    /// Access key id, sent in the Authorization header
    pub access_key_id: String,
    /// Secret key, never sent
    /// ⚠️ NEVER log this value
    pub secret_key: String,
}

impl SigningCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
        }
    }
}

// Custom Debug implementation that hides the keys
impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key_id", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// Header values to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Content-Type`
    pub content_type: String,
    /// `Host`
    pub host: String,
    /// `X-Amz-Date`, `YYYYMMDDThhmmssZ`
    pub amz_date: String,
    /// `Authorization`
    pub authorization: String,
    /// Hex signature, also embedded in `authorization`
    pub signature: String,
}

/// Hex-encoded SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// HMAC-SHA256 of `data` under `key`
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the signing key: `"AWS4" + secret` → date → region → service → `aws4_request`
pub fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// `YYYYMMDDThhmmssZ`
pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `YYYYMMDD`
pub fn date_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

/// `YYYYMMDD/us-east-1/route53/aws4_request`
pub fn credential_scope(date_stamp: &str) -> String {
    format!("{}/{}/{}/aws4_request", date_stamp, REGION, SERVICE)
}

/// Canonical request over the three signed headers and an empty query
pub fn canonical_request(
    method: &str,
    path: &str,
    content_type: &str,
    host: &str,
    amz_date: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-amz-date:{}\n",
        content_type, host, amz_date
    );

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, path, "", canonical_headers, SIGNED_HEADERS, payload_hash
    )
}

/// String to sign for a canonical request
pub fn string_to_sign(amz_date: &str, credential_scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    )
}

/// Sign a request whose body is `payload`, sent at `at`
pub fn sign(
    method: &str,
    path: &str,
    host: &str,
    payload: &[u8],
    credentials: &SigningCredentials,
    at: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = amz_date(at);
    let date_stamp = date_stamp(at);
    let scope = credential_scope(&date_stamp);

    let canonical = canonical_request(
        method,
        path,
        CONTENT_TYPE,
        host,
        &amz_date,
        &sha256_hex(payload),
    );
    let to_sign = string_to_sign(&amz_date, &scope, &canonical);

    let key = signing_key(&credentials.secret_key, &date_stamp, REGION, SERVICE);
    let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, SIGNED_HEADERS, signature
    );

    SignedHeaders {
        content_type: CONTENT_TYPE.to_string(),
        host: host.to_string(),
        amz_date,
        authorization,
        signature,
    }
}
