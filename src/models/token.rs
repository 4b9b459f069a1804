use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::ops::Deref;

use crate::FarmhubError;

/// The opaque credential handed out by the API on login/registration.
///
/// It's the only thing needed to refresh the identity, so it's never
/// printed: `Debug` is redacted, and the raw value is only reachable
/// through `Deref` or [`SessionToken::bearer`].
///
/// A token is guaranteed to be non-empty and free of whitespace (see the
/// `TryFrom` impl), which also covers the value read back from storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Value for the `Authorization` header, ie. `Bearer {token}`
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Deref for SessionToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(**redacted**)")
    }
}

impl TryFrom<String> for SessionToken {
    type Error = FarmhubError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FarmhubError::InvalidToken("No token was found".to_string()));
        }
        if trimmed.split_whitespace().count() > 1 {
            return Err(FarmhubError::InvalidToken(
                "Token must not contain whitespace".to_string(),
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}
