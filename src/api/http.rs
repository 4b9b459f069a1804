use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::{
    api::ApiClient,
    configuration::ApiSettings,
    models::{AuthResponse, Credentials, ProfileUpdatePayload, Registration, SessionToken, User},
    FarmhubError, Result,
};

const LOGIN_ENDPOINT: &str = "auth/login";
const REGISTER_ENDPOINT: &str = "auth/register";
const PROFILE_ENDPOINT: &str = "users/profile";

/// `ApiClient` speaking JSON over HTTP.
///
/// Endpoints are resolved relative to the base URL, so it needs a trailing
/// `/` when the API lives under a path (`http://host/api/`)
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Some deployments wrap the profile in `{ "user": ... }`, others don't
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<ProfileBody> for User {
    fn from(body: ProfileBody) -> Self {
        match body {
            ProfileBody::Wrapped { user } => user,
            ProfileBody::Bare(user) => user,
        }
    }
}

impl HttpApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        Self::new(settings.parse_base_url()?, settings.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        warn!(status = status.as_u16(), %message, "API request was rejected");
        Err(FarmhubError::Api {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[tracing::instrument(skip(self), fields(client = "http"))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let response = self
            .client
            .post(self.endpoint(LOGIN_ENDPOINT)?)
            .json(credentials)
            .send()
            .await?;
        Self::parse(response).await
    }

    #[tracing::instrument(skip(self), fields(client = "http"))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        let response = self
            .client
            .post(self.endpoint(REGISTER_ENDPOINT)?)
            .json(registration)
            .send()
            .await?;
        Self::parse(response).await
    }

    #[tracing::instrument(skip(self, token), fields(client = "http"))]
    async fn get_profile(&self, token: &SessionToken) -> Result<User> {
        let response = self
            .client
            .get(self.endpoint(PROFILE_ENDPOINT)?)
            .header(AUTHORIZATION, token.bearer())
            .send()
            .await?;
        Self::parse::<ProfileBody>(response).await.map(User::from)
    }

    #[tracing::instrument(skip(self, token), fields(client = "http"))]
    async fn update_profile(
        &self,
        payload: &ProfileUpdatePayload,
        token: &SessionToken,
    ) -> Result<User> {
        let response = self
            .client
            .put(self.endpoint(PROFILE_ENDPOINT)?)
            .header(AUTHORIZATION, token.bearer())
            .json(payload)
            .send()
            .await?;
        Self::parse::<ProfileBody>(response).await.map(User::from)
    }
}
