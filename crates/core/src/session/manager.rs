use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::HttpConfig;
use crate::http::{build_client, secs};
use crate::prompt::Prompt;

use super::{CookieFile, SessionError, SessionState};

/// Tracker-specific credential exchange.
///
/// Returns the body of the last response so the manager can look for the
/// post-login marker. Cookies land in the client's jar.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self, client: &Client, timeout: Duration) -> Result<String, SessionError>;
}

/// Where and how a tracker proves a session is alive.
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub tracker: &'static str,
    /// Cookies are scoped to this URL when loaded and saved.
    pub site_url: Url,
    /// Page fetched by [`SessionManager::validate`].
    pub marker_url: String,
    /// Text present only on pages served to a logged-in user.
    pub marker: String,
}

struct Transport {
    jar: Arc<Jar>,
    client: Client,
}

/// Owns one tracker's session: cookie jar, HTTP client and on-disk artifact.
pub struct SessionManager {
    target: SessionTarget,
    http: HttpConfig,
    cookies: CookieFile,
    login_flow: Option<Box<dyn LoginFlow>>,
    transport: RwLock<Transport>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(
        target: SessionTarget,
        cookies: CookieFile,
        login_flow: Option<Box<dyn LoginFlow>>,
        http: &HttpConfig,
    ) -> Result<Self, SessionError> {
        let transport = Self::fresh_transport(http)?;
        Ok(Self {
            target,
            http: http.clone(),
            cookies,
            login_flow,
            transport: RwLock::new(transport),
            state: RwLock::new(SessionState::NoSession),
        })
    }

    fn fresh_transport(http: &HttpConfig) -> Result<Transport, SessionError> {
        let jar = Arc::new(Jar::default());
        let client =
            build_client(Arc::clone(&jar), http).map_err(|e| SessionError::Client(e.to_string()))?;
        Ok(Transport { jar, client })
    }

    pub fn tracker(&self) -> &'static str {
        self.target.tracker
    }

    pub fn cookie_file(&self) -> &CookieFile {
        &self.cookies
    }

    /// Client carrying this session's cookies.
    pub async fn client(&self) -> Client {
        self.transport.read().await.client.clone()
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    async fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().await;
        debug!(tracker = %self.target.tracker, from = ?*state, to = ?next, "Session");
        *state = next;
    }

    /// Load the stored artifact into the jar without contacting the site.
    /// Returns `false` when there is no artifact.
    pub async fn restore(&self) -> Result<bool, SessionError> {
        if !self.cookies.exists().await {
            return Ok(false);
        }
        let transport = self.transport.read().await;
        self.cookies
            .load_into(&transport.jar, &self.target.site_url)
            .await?;
        Ok(true)
    }

    /// Delete the artifact and start over with an empty jar.
    pub async fn invalidate(&self) -> Result<(), SessionError> {
        self.cookies.remove().await?;
        *self.transport.write().await = Self::fresh_transport(&self.http)?;
        self.set_state(SessionState::Invalid).await;
        Ok(())
    }

    /// Run the login flow and persist the resulting session.
    ///
    /// Success requires the marker in the final response. On any failure
    /// the artifact is removed.
    pub async fn login(&self) -> Result<(), SessionError> {
        let flow = self
            .login_flow
            .as_ref()
            .ok_or_else(|| SessionError::NoLoginFlow(self.target.tracker.to_string()))?;

        self.set_state(SessionState::LoggingIn).await;
        *self.transport.write().await = Self::fresh_transport(&self.http)?;
        let client = self.client().await;

        let result = flow
            .login(&client, secs(self.http.validate_timeout_secs))
            .await
            .and_then(|body| {
                if body.contains(&self.target.marker) {
                    Ok(())
                } else {
                    Err(SessionError::AuthenticationFailed(format!(
                        "{} login response has no session marker",
                        self.target.tracker
                    )))
                }
            });

        match result {
            Ok(()) => {
                let transport = self.transport.read().await;
                let saved = self
                    .cookies
                    .save_from(&transport.jar, &self.target.site_url)
                    .await?;
                drop(transport);
                self.set_state(SessionState::Valid).await;
                info!(tracker = %self.target.tracker, cookies = saved, "Logged in");
                Ok(())
            }
            Err(e) => {
                if let Err(remove_err) = self.cookies.remove().await {
                    warn!(tracker = %self.target.tracker, error = %remove_err, "Failed to remove session artifact");
                }
                self.set_state(SessionState::Invalid).await;
                Err(e)
            }
        }
    }

    /// Check the stored session against the marker page.
    ///
    /// A missing artifact is `Invalid` without any request. Never logs in.
    pub async fn validate(&self) -> Result<SessionState, SessionError> {
        if !self.restore().await? {
            debug!(tracker = %self.target.tracker, "No session artifact");
            self.set_state(SessionState::Invalid).await;
            return Ok(SessionState::Invalid);
        }

        let client = self.client().await;
        let response = client
            .get(&self.target.marker_url)
            .timeout(secs(self.http.validate_timeout_secs))
            .send()
            .await?;
        let body = response.text().await?;

        let next = if body.contains(&self.target.marker) {
            SessionState::Valid
        } else {
            SessionState::Invalid
        };
        self.set_state(next).await;
        Ok(next)
    }

    /// Make sure the session is usable before an upload.
    ///
    /// Logs in when there is no artifact, validates, and if the session is
    /// still invalid offers exactly one fresh login.
    pub async fn validate_credentials(&self, prompt: &dyn Prompt) -> Result<(), SessionError> {
        if !self.cookies.exists().await {
            match self.login().await {
                Ok(()) => {}
                Err(e @ (SessionError::AuthenticationFailed(_) | SessionError::NoLoginFlow(_))) => {
                    warn!(tracker = %self.target.tracker, error = %e, "Login failed");
                }
                Err(e) => return Err(e),
            }
        }

        if self.validate().await?.is_valid() {
            return Ok(());
        }

        warn!(tracker = %self.target.tracker, "Session is not valid");
        if prompt.confirm("Log in again and create new session?", false) {
            self.invalidate().await?;
            self.login().await?;
            if self.validate().await?.is_valid() {
                return Ok(());
            }
        }

        Err(SessionError::AuthenticationFailed(format!(
            "{} session could not be validated",
            self.target.tracker
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompt;
    use tempfile::TempDir;

    fn target() -> SessionTarget {
        SessionTarget {
            tracker: "TST",
            site_url: Url::parse("http://127.0.0.1:9/").unwrap(),
            marker_url: "http://127.0.0.1:9/index.php".into(),
            marker: "Logout".into(),
        }
    }

    struct RejectingLogin;

    #[async_trait]
    impl LoginFlow for RejectingLogin {
        async fn login(&self, _client: &Client, _timeout: Duration) -> Result<String, SessionError> {
            Ok("<form>Login failed</form>".into())
        }
    }

    #[tokio::test]
    async fn test_validate_without_artifact_is_invalid() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(
            target(),
            CookieFile::new(temp.path().join("TST.txt")),
            None,
            &HttpConfig::default(),
        )
        .unwrap();

        assert_eq!(manager.state().await, SessionState::NoSession);
        assert_eq!(manager.validate().await.unwrap(), SessionState::Invalid);
        assert_eq!(manager.state().await, SessionState::Invalid);
    }

    #[tokio::test]
    async fn test_login_without_flow() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(
            target(),
            CookieFile::new(temp.path().join("TST.txt")),
            None,
            &HttpConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            manager.login().await,
            Err(SessionError::NoLoginFlow(_))
        ));
    }

    #[tokio::test]
    async fn test_login_without_marker_leaves_no_artifact() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(
            target(),
            CookieFile::new(temp.path().join("TST.txt")),
            Some(Box::new(RejectingLogin)),
            &HttpConfig::default(),
        )
        .unwrap();

        let err = manager.login().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationFailed(_)));
        assert!(!manager.cookie_file().exists().await);
        assert_eq!(manager.state().await, SessionState::Invalid);
    }

    #[tokio::test]
    async fn test_validate_credentials_declined_relogin() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::new(
            target(),
            CookieFile::new(temp.path().join("TST.txt")),
            Some(Box::new(RejectingLogin)),
            &HttpConfig::default(),
        )
        .unwrap();
        let prompt = ScriptedPrompt::new().confirm_with(false);

        let err = manager.validate_credentials(&prompt).await.unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationFailed(_)));
        assert_eq!(prompt.questions().len(), 1);
    }
}
