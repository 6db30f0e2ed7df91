use async_trait::async_trait;
use reqwest::StatusCode;

use crate::core::config::CoreApiConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthToken, SignInData, SignInRequest};
use crate::shared::http;

/// Obtains a bearer token for the service account
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self) -> Result<AuthToken>;
}

/// Client for the upstream sign-in endpoint
pub struct CoreAuthClient {
    config: CoreApiConfig,
    http_client: reqwest::Client,
}

impl CoreAuthClient {
    pub fn new(config: CoreApiConfig) -> Result<Self> {
        let http_client = http::build_client(config.request_timeout)?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl Authenticator for CoreAuthClient {
    async fn sign_in(&self) -> Result<AuthToken> {
        let url = self.config.endpoint(&self.config.auth_route, "/signin");

        tracing::debug!("Signing in to core as {}", self.config.username);

        let response = self
            .http_client
            .post(&url)
            .json(&SignInRequest {
                email: &self.config.username,
                password: &self.config.password,
            })
            .send()
            .await?;

        let data: SignInData =
            http::read_data(response, &[StatusCode::CREATED, StatusCode::OK]).await?;

        if data.jwt.is_empty() {
            return Err(AppError::Unauthenticated(
                "sign-in returned an empty token".to_string(),
            ));
        }

        Ok(AuthToken::new(data.jwt))
    }
}
