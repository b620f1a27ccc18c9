//! Publish client for the target platform.
//!
//! Speaks the platform's web endpoints directly: a form login that sets the
//! session cookie, a multipart photo upload, and a logout. The client keeps
//! one `authenticated` flag mirroring the session's state; the pipeline
//! re-logs-in around every upload, so the flag never outlives one file's
//! publish attempt by much.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::contract::Publisher;
use crate::error::{PublishError, SetupError};

const DEFAULT_BASE_URL: &str = "https://www.instagram.com";
const USER_AGENT: &str = concat!("redgram/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct LoginResponse {
    authenticated: bool,
}

pub struct InstagramClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    authenticated: bool,
}

impl InstagramClient {
    pub fn new(username: String, password: String) -> Result<Self, SetupError> {
        Self::with_base_url(username, password, DEFAULT_BASE_URL.to_string())
    }

    /// Same client against a different endpoint. Exists for tests against a
    /// local stand-in server.
    pub fn with_base_url(
        username: String,
        password: String,
        base_url: String,
    ) -> Result<Self, SetupError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
            authenticated: false,
        })
    }

    fn mime_for(path: &Path) -> &'static str {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl Publisher for InstagramClient {
    async fn login(&mut self) -> Result<bool, PublishError> {
        let resp = self
            .http
            .post(format!("{}/accounts/login/ajax/", self.base_url))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!(user = %self.username, status = %resp.status(), "login rejected");
            return Ok(false);
        }

        let body: LoginResponse = resp.json().await?;
        self.authenticated = body.authenticated;
        debug!(user = %self.username, authenticated = self.authenticated, "login response");
        Ok(self.authenticated)
    }

    async fn upload_image(&mut self, path: &Path, caption: &str) -> Result<bool, PublishError> {
        if !self.authenticated {
            warn!(path = %path.display(), "upload refused: not authenticated");
            return Ok(false);
        }

        let bytes = fs::read(path).map_err(|source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(Self::mime_for(path))?;
        let form = multipart::Form::new()
            .part("photo", part)
            .text("caption", caption.to_string());

        let resp = self
            .http
            .post(format!("{}/create/upload/photo/", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let accepted = resp.status().is_success();
        if accepted {
            info!(path = %path.display(), "image published");
        } else {
            warn!(path = %path.display(), status = %resp.status(), "upload rejected");
        }
        Ok(accepted)
    }

    async fn logout(&mut self) -> Result<bool, PublishError> {
        if !self.authenticated {
            // Already logged out; nothing to do.
            return Ok(true);
        }

        let resp = self
            .http
            .post(format!("{}/accounts/logout/", self.base_url))
            .send()
            .await?;
        if resp.status().is_success() {
            self.authenticated = false;
            debug!(user = %self.username, "logged out");
            Ok(true)
        } else {
            warn!(user = %self.username, status = %resp.status(), "logout rejected");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> InstagramClient {
        InstagramClient::with_base_url(
            "bot".to_string(),
            "secret".to_string(),
            "http://127.0.0.1:9".to_string(),
        )
        .expect("client builds")
    }

    #[tokio::test]
    async fn upload_refuses_when_not_authenticated() {
        let mut client = client();
        let accepted = client
            .upload_image(Path::new("nowhere.jpg"), "caption")
            .await
            .expect("refusal is not an error");
        assert!(!accepted);
    }

    #[tokio::test]
    async fn logout_is_noop_success_when_already_logged_out() {
        let mut client = client();
        assert!(client.logout().await.expect("noop logout succeeds"));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(InstagramClient::mime_for(Path::new("a.png")), "image/png");
        assert_eq!(InstagramClient::mime_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(InstagramClient::mime_for(Path::new("a")), "image/jpeg");
    }
}
