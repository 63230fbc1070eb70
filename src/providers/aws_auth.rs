/*!
 * AWS credentials and Signature Version 4 request signing.
 *
 * Both backends talk to AWS JSON endpoints over plain `reqwest`; every
 * request is signed here with the `AWS4-HMAC-SHA256` scheme.
 */

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use super::{status_error, transport_error};
use crate::errors::{AppError, TranslationError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Static AWS credentials
#[derive(Clone, PartialEq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Read credentials from the standard AWS environment variables
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_key_id = non_empty(ACCESS_KEY_ENV).ok_or_else(|| {
            AppError::Configuration(format!("AWS credentials not found: {} is not set", ACCESS_KEY_ENV))
        })?;
        let secret_access_key = non_empty(SECRET_KEY_ENV).ok_or_else(|| {
            AppError::Configuration(format!("AWS credentials not found: {} is not set", SECRET_KEY_ENV))
        })?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: non_empty(SESSION_TOKEN_ENV),
        })
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, TranslationError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| TranslationError::RequestFailed(format!("Failed to sign request: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode everything except RFC 3986 unreserved characters
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

/// Derive the request signing key for a date (`YYYYMMDD`), region and service
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, TranslationError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Path with every segment encoded once more, as non-S3 services expect
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| uri_encode(segment, true))
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k, true), uri_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs requests for one service in one region
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Headers to add to a request so that it is signed at the current time
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>, TranslationError> {
        self.sign_at(method, url, headers, body, Utc::now())
    }

    /// Headers to add to a request so that it is signed at `now`
    ///
    /// The returned list holds `x-amz-date`, `x-amz-security-token` when a
    /// session token is configured, and `authorization`.
    pub fn sign_at(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, TranslationError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        signed.push(("host".to_string(), host_header(url)));
        signed.push(("x-amz-date".to_string(), amz_date.clone()));
        if let Some(token) = &self.credentials.session_token {
            signed.push(("x-amz-security-token".to_string(), token.clone()));
        }
        signed.sort();

        let (canonical, signed_headers) = canonical_request(method, url, &signed, body);
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            sha256_hex(canonical.as_bytes())
        );

        let key = signing_key(&self.credentials.secret_access_key, &date, &self.region, &self.service)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        let mut result = vec![("x-amz-date".to_string(), amz_date)];
        if let Some(token) = &self.credentials.session_token {
            result.push(("x-amz-security-token".to_string(), token.clone()));
        }
        result.push((
            "authorization".to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
            ),
        ));
        Ok(result)
    }
}

/// POST a signed request and return the response body
///
/// Non-success statuses are mapped to typed errors; the body of an error
/// response becomes the error message.
pub(crate) async fn post_signed(
    client: &reqwest::Client,
    signer: &SigV4Signer,
    url: &Url,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> Result<String, TranslationError> {
    let signature = signer.sign("POST", url, headers, &body)?;

    let mut request = client.post(url.clone());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    for (name, value) in &signature {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.body(body).send().await.map_err(transport_error)?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| TranslationError::RequestFailed(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(status_error(status, text));
    }
    Ok(text)
}

/// Canonical request text and the signed header list
fn canonical_request(
    method: &str,
    url: &Url,
    sorted_headers: &[(String, String)],
    body: &[u8],
) -> (String, String) {
    let canonical_headers: String = sorted_headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();
    let signed_headers = sorted_headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        canonical_uri(url),
        canonical_query(url),
        canonical_headers,
        signed_headers,
        sha256_hex(body)
    );
    (canonical, signed_headers)
}
