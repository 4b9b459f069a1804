mod http;

pub use http::HttpApiClient;

use async_trait::async_trait;

use crate::{
    models::{AuthResponse, Credentials, ProfileUpdatePayload, Registration, SessionToken, User},
    Result,
};

/// The remote account API.
///
/// Failures come back as `FarmhubError::Api` whose message is meant to be
/// shown to the user as-is
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;
    async fn register(&self, registration: &Registration) -> Result<AuthResponse>;
    async fn get_profile(&self, token: &SessionToken) -> Result<User>;
    async fn update_profile(
        &self,
        payload: &ProfileUpdatePayload,
        token: &SessionToken,
    ) -> Result<User>;
}

#[async_trait]
impl<T: ApiClient + ?Sized> ApiClient for std::sync::Arc<T> {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        (**self).login(credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        (**self).register(registration).await
    }

    async fn get_profile(&self, token: &SessionToken) -> Result<User> {
        (**self).get_profile(token).await
    }

    async fn update_profile(
        &self,
        payload: &ProfileUpdatePayload,
        token: &SessionToken,
    ) -> Result<User> {
        (**self).update_profile(payload, token).await
    }
}
