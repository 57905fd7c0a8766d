use crate::credential::CredentialError;
use http::Extensions;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::sync::Arc;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

// The type returned by ServiceAccountAuthenticator::builder(...).build().await
// with hyper 1 / hyper-rustls 0.27.
type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/datastore",
];

/// A source of OAuth2 bearer tokens.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, anyhow::Error>;
}

/// Mints access tokens from a service-account key.
pub struct ServiceAccountTokens {
    authenticator: AuthType,
}

impl ServiceAccountTokens {
    /// Builds the authenticator. This only parses the key material; no request is made.
    pub async fn new(key: ServiceAccountKey) -> Result<Self, CredentialError> {
        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(CredentialError::InvalidKey)?;
        Ok(Self { authenticator })
    }
}

#[async_trait::async_trait]
impl TokenProvider for ServiceAccountTokens {
    async fn token(&self) -> Result<String, anyhow::Error> {
        let token = self.authenticator.token(SCOPES).await?;
        Ok(token
            .token()
            .ok_or_else(|| anyhow::anyhow!("No token found"))?
            .to_string())
    }
}

/// A fixed token, as accepted by the Firestore emulator (`owner`).
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, anyhow::Error> {
        Ok(self.0.clone())
    }
}

/// Adds `Authorization: Bearer <token>` to every outgoing request.
#[derive(Clone)]
pub struct AuthMiddleware {
    provider: Arc<dyn TokenProvider>,
}

impl AuthMiddleware {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.provider.token().await.map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Failed to get auth token: {}", e))
        })?;

        let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Invalid auth token: {}", e))
        })?;
        req.headers_mut().insert(header::AUTHORIZATION, value);

        next.run(req, extensions).await
    }
}
