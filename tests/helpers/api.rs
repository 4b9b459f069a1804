use async_trait::async_trait;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use farmhub::{
    api::ApiClient,
    models::{
        AccountId, AuthResponse, Credentials, ProfileUpdatePayload, Registration, Role,
        SessionToken, User,
    },
    FarmhubError, Result,
};

const TOKEN_PREFIX: &str = "fake.";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get_profile: usize,
    pub update_profile: usize,
}

/// Account API backed by a `HashMap`. Tokens are just the account email
/// behind a prefix, and only the profile calls are counted
#[derive(Default)]
pub struct FakeApi {
    accounts: Mutex<HashMap<String, (String, User)>>,
    get_profile: AtomicUsize,
    update_profile: AtomicUsize,
}

impl FakeApi {
    pub fn add_account(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let mut accounts = self.accounts.lock().unwrap();
        let user = User {
            id: AccountId::new(format!("acc-{}", accounts.len() + 1)),
            full_name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: None,
            role,
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            get_profile: self.get_profile.load(Ordering::SeqCst),
            update_profile: self.update_profile.load(Ordering::SeqCst),
        }
    }

    fn session_for(user: User) -> AuthResponse {
        let token = SessionToken::try_from(format!("{}{}", TOKEN_PREFIX, user.email)).unwrap();
        AuthResponse { token, user }
    }

    fn user_for(&self, token: &SessionToken) -> Result<User> {
        let email = token.strip_prefix(TOKEN_PREFIX).ok_or(FarmhubError::Api {
            status: Some(401),
            message: "Invalid token".into(),
        })?;
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|(_, user)| user.clone())
            .ok_or(FarmhubError::Api {
                status: Some(404),
                message: "User not found".into(),
            })
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        match self.accounts.lock().unwrap().get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => {
                Ok(Self::session_for(user.clone()))
            }
            _ => Err(FarmhubError::Api {
                status: Some(401),
                message: "Invalid email or password".into(),
            }),
        }
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        if self
            .accounts
            .lock()
            .unwrap()
            .contains_key(&registration.email)
        {
            return Err(FarmhubError::Api {
                status: Some(409),
                message: "User already exists".into(),
            });
        }
        let user = self.add_account(
            &registration.name,
            &registration.email,
            &registration.password,
            Role::Customer,
        );
        Ok(Self::session_for(user))
    }

    async fn get_profile(&self, token: &SessionToken) -> Result<User> {
        self.get_profile.fetch_add(1, Ordering::SeqCst);
        self.user_for(token)
    }

    async fn update_profile(
        &self,
        payload: &ProfileUpdatePayload,
        token: &SessionToken,
    ) -> Result<User> {
        self.update_profile.fetch_add(1, Ordering::SeqCst);
        let mut user = self.user_for(token)?;
        user.full_name = payload.full_name.clone();
        user.phone = payload.phone.clone();
        user.address = payload.address.clone();
        if let Some((_, stored)) = self.accounts.lock().unwrap().get_mut(&user.email) {
            *stored = user.clone();
        }
        Ok(user)
    }
}
