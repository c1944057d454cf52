use crate::api::model::auth::{RefreshResponse, TokenResponse};
use crate::api::model::user::PublicUser;
use crate::client::refresh_coordinator::{RefreshCoordinator, RefreshTicket};
use derive_more::Display;
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Debug, Display, derive_more::Error)]
pub enum ClientError {
    #[display("transport error: {message}")]
    Transport {
        #[error(not(source))]
        message: String,
    },
    #[display("invalid credentials")]
    Unauthorized,
    #[display("email already registered")]
    Conflict,
    #[display("session expired; sign in again")]
    SessionExpired,
    #[display("unexpected status: {status}")]
    UnexpectedStatus {
        #[error(not(source))]
        status: u16,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport {
            message: e.to_string(),
        }
    }
}

struct SessionState {
    access_token: RwLock<Option<String>>,
    user: RwLock<Option<PublicUser>>,
    coordinator: RefreshCoordinator,
}

/// API client that makes the access/refresh token split invisible to callers.
///
/// The refresh token lives in the http client's cookie jar and is never
/// touched directly; the access token is held in memory and attached as a
/// Bearer header. A 401 on a protected call triggers one coordinated silent
/// refresh and a single replay of the original request.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    state: Arc<SessionState>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Arc::new(SessionState {
                access_token: RwLock::new(None),
                user: RwLock::new(None),
                coordinator: RefreshCoordinator::new(),
            }),
        })
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.access_token.read().await.clone()
    }

    /// Restores a token persisted by the embedder (the "page reload" path).
    pub async fn restore_access_token(&self, token: impl Into<String>) {
        *self.state.access_token.write().await = Some(token.into());
    }

    pub async fn current_user(&self) -> Option<PublicUser> {
        self.state.user.read().await.clone()
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, ClientError> {
        self.open_session(
            "/auth/signup",
            json!({ "name": name, "email": email, "password": password }),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        self.open_session(
            "/auth/login",
            json!({ "email": email, "password": password }),
            StatusCode::OK,
        )
        .await
    }

    async fn open_session(
        &self,
        path: &str,
        payload: Value,
        expected: StatusCode,
    ) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&payload)
            .send()
            .await?;
        match response.status() {
            status if status == expected => {
                let body: TokenResponse = response.json().await?;
                *self.state.access_token.write().await = Some(body.access_token);
                *self.state.user.write().await = Some(body.user.clone());
                Ok(body.user)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::CONFLICT => Err(ClientError::Conflict),
            status => Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }

    /// Best-effort logout: the server answers 200 even for a stale cookie,
    /// and local state is cleared regardless of transport errors.
    pub async fn logout(&self) {
        if let Err(e) = self
            .http
            .post(format!("{}/auth/logout", self.base_url))
            .send()
            .await
        {
            warn!("Logout call failed: {e}");
        }
        self.clear_session().await;
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Response, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Sends a protected request, transparently refreshing the session on a
    /// 401 and replaying the request once. A 401 after the replay is a hard
    /// failure; it never re-enters the refresh path.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ClientError> {
        let token = self.access_token().await;
        let response = self
            .send(&method, path, body.as_ref(), token.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let fresh = self.refresh_access_token().await?;
        let retried = self.send(&method, path, body.as_ref(), Some(&fresh)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        Ok(retried)
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Joins the in-flight refresh or initiates one. The initiator publishes
    /// its outcome to every queued waiter; a failed refresh tears the local
    /// session down so the next action fails fast instead of looping.
    async fn refresh_access_token(&self) -> Result<String, ClientError> {
        match self.state.coordinator.begin().await {
            RefreshTicket::Waiter(rx) => match rx.await {
                Ok(Some(token)) => Ok(token),
                _ => Err(ClientError::SessionExpired),
            },
            RefreshTicket::Initiator => match self.call_refresh_endpoint().await {
                Ok(token) => {
                    *self.state.access_token.write().await = Some(token.clone());
                    self.state.coordinator.finish(Some(token.clone())).await;
                    Ok(token)
                }
                Err(e) => {
                    self.clear_session().await;
                    self.state.coordinator.finish(None).await;
                    Err(e)
                }
            },
        }
    }

    async fn call_refresh_endpoint(&self) -> Result<String, ClientError> {
        // The refresh cookie rides along automatically.
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::SessionExpired);
        }
        let body: RefreshResponse = response.json().await?;
        Ok(body.access_token)
    }

    async fn clear_session(&self) {
        *self.state.access_token.write().await = None;
        *self.state.user.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }

    #[tokio::test]
    async fn restored_token_is_visible() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.access_token().await, None);
        client.restore_access_token("persisted").await;
        assert_eq!(client.access_token().await.as_deref(), Some("persisted"));
    }
}
