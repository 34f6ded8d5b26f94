//! AWS Signature Version 4 request signing.
//!
//! Only what a JSON-1.1 POST needs: caller-supplied path and canonical query
//! string, an explicit header list, and a fully buffered payload.

use std::fmt;

use chrono::{DateTime, Utc};
use ring::{digest, hmac};

use crate::service::ClientError;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, and the optional
    /// `AWS_SESSION_TOKEN` from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        let required = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ClientError::MissingCredentials(name))
        };
        Ok(Self {
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            session_token: std::env::var("AWS_SESSION_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The parts of an HTTP request covered by the signature.
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Already in canonical form (sorted, URI-encoded).
    pub query: &'a str,
    /// Extra headers to sign, besides `host` and `x-amz-date`.
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

/// Signing scope: who signs, for which region and service.
pub struct Signer<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
}

impl Signer<'_> {
    /// Headers to add to the request: `x-amz-date`, `x-amz-security-token`
    /// when a session token is present, and `authorization`.
    pub fn sign(&self, request: &SigningRequest<'_>, time: DateTime<Utc>) -> Vec<(String, String)> {
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = time.format("%Y%m%d").to_string();

        let mut extra = vec![("x-amz-date".to_string(), amz_date.clone())];
        if let Some(token) = &self.credentials.session_token {
            extra.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let (canonical, signed_headers) = canonical_request(request, &extra);
        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical.as_bytes())
        );

        let key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            self.region,
            self.service,
        );
        let signature = hex::encode(hmac::sign(&key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        );
        extra.push(("authorization".to_string(), authorization));
        extra
    }
}

/// Canonical request text and the `;`-joined signed header names.
fn canonical_request(
    request: &SigningRequest<'_>,
    extra: &[(String, String)],
) -> (String, String) {
    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .chain(std::iter::once(("host".to_string(), request.host.to_string())))
        .chain(extra.iter().cloned())
        .collect();
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{}",
        request.method,
        request.path,
        request.query,
        sha256_hex(request.payload)
    );
    (canonical, signed_headers)
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> hmac::Key {
    let k_date = hmac_bytes(format!("AWS4{secret}").as_bytes(), date);
    let k_region = hmac_bytes(&k_date, region);
    let k_service = hmac_bytes(&k_region, service);
    let k_signing = hmac_bytes(&k_service, "aws4_request");
    hmac::Key::new(hmac::HMAC_SHA256, &k_signing)
}

fn hmac_bytes(key: &[u8], data: &str) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data.as_bytes()).as_ref().to_vec()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, data))
}
