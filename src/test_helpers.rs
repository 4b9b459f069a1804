use async_trait::async_trait;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    api::ApiClient,
    models::{
        AccountId, AuthResponse, Credentials, ProfileUpdatePayload, Registration, Role,
        SessionToken, User,
    },
    FarmhubError, Result,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub login: usize,
    pub register: usize,
    pub get_profile: usize,
    pub update_profile: usize,
}

/// In-memory stand-in for the account API, used by the unit tests
#[derive(Default)]
pub struct MockApi {
    accounts: Mutex<HashMap<String, (String, User)>>,
    tokens: Mutex<HashMap<String, String>>,
    login: AtomicUsize,
    register: AtomicUsize,
    get_profile: AtomicUsize,
    update_profile: AtomicUsize,
    fail_profile: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockApi {
    pub fn with_account(self, name: &str, email: &str, password: &str) -> Self {
        self.with_role_account(name, email, password, Role::Customer)
    }

    pub fn with_role_account(self, name: &str, email: &str, password: &str, role: Role) -> Self {
        self.insert_account(name, email, password, role);
        self
    }

    fn insert_account(&self, name: &str, email: &str, password: &str, role: Role) -> User {
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

    /// Hands out a token as if the account had logged in earlier
    pub fn issue_token(&self, email: &str) -> SessionToken {
        let mut tokens = self.tokens.lock().unwrap();
        let raw = format!("token-{}-{}", tokens.len() + 1, email);
        tokens.insert(raw.clone(), email.to_string());
        SessionToken::try_from(raw).unwrap()
    }

    pub fn fail_profile_requests(&self, fail: bool) {
        self.fail_profile.store(fail, Ordering::SeqCst);
    }

    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            login: self.login.load(Ordering::SeqCst),
            register: self.register.load(Ordering::SeqCst),
            get_profile: self.get_profile.load(Ordering::SeqCst),
            update_profile: self.update_profile.load(Ordering::SeqCst),
        }
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn user_for(&self, token: &SessionToken) -> Result<User> {
        let email = self
            .tokens
            .lock()
            .unwrap()
            .get(&**token)
            .cloned()
            .ok_or_else(|| rejected(401, "Invalid token"))?;
        self.accounts
            .lock()
            .unwrap()
            .get(&email)
            .map(|(_, user)| user.clone())
            .ok_or_else(|| rejected(404, "User not found"))
    }
}

fn rejected(status: u16, message: &str) -> FarmhubError {
    FarmhubError::Api {
        status: Some(status),
        message: message.to_string(),
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.login.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let user = match self.accounts.lock().unwrap().get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => user.clone(),
            _ => return Err(rejected(401, "Invalid email or password")),
        };
        Ok(AuthResponse {
            token: self.issue_token(&user.email),
            user,
        })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        self.register.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self
            .accounts
            .lock()
            .unwrap()
            .contains_key(&registration.email)
        {
            return Err(rejected(409, "Email is already registered"));
        }
        let user = self.insert_account(
            &registration.name,
            &registration.email,
            &registration.password,
            Role::Customer,
        );
        Ok(AuthResponse {
            token: self.issue_token(&user.email),
            user,
        })
    }

    async fn get_profile(&self, token: &SessionToken) -> Result<User> {
        self.get_profile.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(rejected(500, "Internal Server Error"));
        }
        self.user_for(token)
    }

    async fn update_profile(
        &self,
        payload: &ProfileUpdatePayload,
        token: &SessionToken,
    ) -> Result<User> {
        self.update_profile.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let mut user = self.user_for(token)?;
        if payload.id.as_ref() != Some(&user.id) {
            return Err(rejected(403, "Cannot update another account"));
        }
        user.full_name = payload.full_name.clone();
        user.phone = payload.phone.clone();
        user.address = payload.address.clone();
        if let Some((_, stored)) = self.accounts.lock().unwrap().get_mut(&user.email) {
            *stored = user.clone();
        }
        Ok(user)
    }
}
