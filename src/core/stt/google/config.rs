//! Google Cloud Speech-to-Text v1 configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default gRPC endpoint of the v1 Speech API.
pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com";

/// Default recognition model, tuned for short commands.
pub const DEFAULT_MODEL: &str = "command_and_search";

/// Google Speech provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleSpeechConfig {
    /// gRPC endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// OAuth2 access token sent as a bearer token
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Capacity of the per-session request queue
    #[serde(default = "default_request_buffer")]
    pub request_buffer: usize,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_buffer() -> usize {
    64
}

impl Default for GoogleSpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
            connect_timeout_secs: default_connect_timeout(),
            request_buffer: default_request_buffer(),
        }
    }
}

impl std::fmt::Debug for GoogleSpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechConfig")
            .field("endpoint", &self.endpoint)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_buffer", &self.request_buffer)
            .finish()
    }
}

impl Drop for GoogleSpeechConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.access_token {
            token.zeroize();
        }
    }
}

impl GoogleSpeechConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(format!(
                "Google Speech endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ));
        }

        if self.endpoint.starts_with("https://")
            && self.access_token.as_deref().is_none_or(str::is_empty)
        {
            return Err(
                "Google access token is required. Set GOOGLE_ACCESS_TOKEN environment variable."
                    .to_string(),
            );
        }

        if self.connect_timeout_secs == 0 {
            return Err("Connect timeout must be greater than zero".to_string());
        }

        if self.request_buffer == 0 {
            return Err("Request buffer must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn uses_tls(&self) -> bool {
        self.endpoint.starts_with("https://")
    }
}
