//! OAuth 1.0a request signing
//!
//! Every API call carries an `Authorization: OAuth ...` header signed with
//! HMAC-SHA1 over the method, the base URL and the sorted request parameters.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

use crate::client::ApiError;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Consumer and access-token credentials for one account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Build the `Authorization` header for a request with a fresh nonce and
    /// the current time.
    pub fn authorization(
        &self,
        method: &str,
        url: &Url,
        params: &[(String, String)],
    ) -> Result<String, ApiError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_with(method, url, params, &nonce, timestamp)
    }

    /// Build the `Authorization` header with an explicit nonce and timestamp.
    pub fn authorization_with(
        &self,
        method: &str,
        url: &Url,
        params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, ApiError> {
        let mut oauth = self.oauth_params(nonce, timestamp);
        let base = signature_base(method, url, params, &oauth);
        let signature = self.sign(&base)?;
        oauth.push(("oauth_signature".to_string(), signature));
        oauth.sort();

        let fields: Vec<String> = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn oauth_params(&self, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    fn sign(&self, base: &str) -> Result<String, ApiError> {
        let key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.token_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|_| ApiError::Signing("failed to initialize hmac".to_string()))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `METHOD&base_url&parameter_string`, each part percent-encoded.
fn signature_base(
    method: &str,
    url: &Url,
    params: &[(String, String)],
    oauth: &[(String, String)],
) -> String {
    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(params.iter().chain(oauth).map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url.as_str()),
        encode(&param_string)
    )
}
