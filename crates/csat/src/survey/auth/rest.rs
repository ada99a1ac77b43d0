use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{AdminUser, AuthError, AuthGateway, Credentials, Session};
use crate::config::StoreConfig;

/// Client for the hosted store's auth endpoints.
#[derive(Clone)]
pub struct RestAuthGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AdminUser,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Wrapped { user: AdminUser },
    Bare(AdminUser),
}

impl RestAuthGateway {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
    }
}

#[async_trait]
impl AuthGateway for RestAuthGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let response = self
            .request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            warn!("admin sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token: TokenResponse = read_json(response).await?;
        info!(user = %token.user.email, "admin signed in");
        Ok(Session {
            expires_at: token
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
            access_token: token.access_token,
            user: token.user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(Method::POST, "logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .request(Method::POST, "recover")
            .json(&json!({ "email": email }))
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn current_session(&self, access_token: &str) -> Result<AdminUser, AuthError> {
        let response = self
            .request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(AuthError::Unauthenticated);
        }
        read_json(response).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AdminUser, AuthError> {
        let response = self
            .request(Method::POST, "signup")
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await?;
        let user = match read_json::<SignUpResponse>(response).await? {
            SignUpResponse::Wrapped { user } | SignUpResponse::Bare(user) => user,
        };
        info!(user = %user.email, "admin account created");
        Ok(user)
    }
}

async fn ensure_success(response: Response) -> Result<(), AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }
    Ok(response.json().await?)
}
