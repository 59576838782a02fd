// src/infrastructure/broker/auth.rs
// Session bootstrap: reuse a stored access token or run the request-token login

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::domain::errors::{SessionError, SessionResult};
use crate::infrastructure::broker::{dto, KiteSession, KITE_VERSION};
use crate::infrastructure::http::HttpTransport;

const LOGIN_URL: &str = "https://kite.zerodha.com/connect/login";

/// API credentials of the Kite Connect app.
#[derive(Debug, Clone)]
pub struct KiteCredentials {
    pub api_key: String,
    pub api_secret: String,
}

pub struct KiteAuthenticator {
    credentials: KiteCredentials,
    base_url: String,
    token_file: Option<PathBuf>,
    transport: HttpTransport,
}

impl KiteAuthenticator {
    pub fn new(credentials: KiteCredentials, base_url: &str, transport: HttpTransport) -> Self {
        Self {
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_file: None,
            transport,
        }
    }

    /// Persist freshly generated tokens to (and read candidates from) this file.
    pub fn with_token_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.token_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn login_url(&self) -> String {
        format!("{}?v=3&api_key={}", LOGIN_URL, self.credentials.api_key)
    }

    /// Acquire a session. Stored tokens are tried in order (explicit candidates
    /// first, then the token file); when none validates, `prompt` is shown the
    /// login URL and must return the request token from the redirect.
    pub async fn acquire<F>(&self, candidates: &[String], prompt: F) -> SessionResult<KiteSession>
    where
        F: FnOnce(&str) -> SessionResult<String>,
    {
        if self.credentials.api_key.is_empty() {
            return Err(SessionError::MissingCredential("api_key".to_string()));
        }

        let stored = self.read_token_file();
        for token in candidates.iter().chain(stored.iter()) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if self.validate(token).await {
                log::info!("Using stored access token");
                return Ok(self.session(token));
            }
            log::warn!("Stored access token is invalid or expired");
        }

        let request_token = prompt(&self.login_url())?;
        let access_token = self.generate_access_token(request_token.trim()).await?;
        self.save_token_file(&access_token)?;
        log::info!("Access token set successfully");

        Ok(self.session(&access_token))
    }

    fn session(&self, access_token: &str) -> KiteSession {
        KiteSession::new(
            &self.credentials.api_key,
            access_token,
            &self.base_url,
            self.transport.clone(),
        )
    }

    /// A token is valid when `/user/profile` answers 2xx with it.
    pub async fn validate(&self, access_token: &str) -> bool {
        let headers = [
            ("X-Kite-Version", KITE_VERSION.to_string()),
            (
                "Authorization",
                format!("token {}:{}", self.credentials.api_key, access_token),
            ),
        ];
        let url = format!("{}/user/profile", self.base_url);

        match self.transport.get(&url, &headers).await {
            Ok(response) => {
                let valid = response.status.is_success();
                if !valid {
                    log::debug!("Access token validation failed with status {}", response.status);
                }
                valid
            }
            Err(e) => {
                log::debug!("Access token validation request failed: {}", e);
                false
            }
        }
    }

    /// Exchange a request token for an access token at `/session/token`.
    pub async fn generate_access_token(&self, request_token: &str) -> SessionResult<String> {
        if self.credentials.api_secret.is_empty() {
            return Err(SessionError::MissingCredential("api_secret".to_string()));
        }
        if request_token.is_empty() {
            return Err(SessionError::Authentication("empty request token".to_string()));
        }

        let form = [
            ("api_key", self.credentials.api_key.clone()),
            ("request_token", request_token.to_string()),
            (
                "checksum",
                session_checksum(&self.credentials.api_key, request_token, &self.credentials.api_secret),
            ),
        ];
        let headers = [("X-Kite-Version", KITE_VERSION.to_string())];
        let url = format!("{}/session/token", self.base_url);

        let response = self
            .transport
            .post_form(&url, &headers, &form)
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;
        let body = response
            .json()
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let data = dto::unwrap_envelope(&body).map_err(SessionError::Authentication)?;
        data.get("access_token")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                SessionError::Authentication("access token not found in session response".to_string())
            })
    }

    fn read_token_file(&self) -> Option<String> {
        let path = self.token_file.as_ref()?;
        match fs::read_to_string(path) {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                log::debug!("No access token at {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save_token_file(&self, access_token: &str) -> SessionResult<()> {
        let Some(path) = &self.token_file else {
            return Ok(());
        };
        fs::write(path, access_token)
            .map_err(|e| SessionError::TokenCache(format!("{}: {}", path.display(), e)))?;
        log::info!("Access token saved to {}", path.display());
        Ok(())
    }
}

/// SHA-256 hex digest of api_key + request_token + api_secret.
pub fn session_checksum(api_key: &str, request_token: &str, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(request_token.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
