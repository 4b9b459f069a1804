use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumString, ToString};

use crate::{FarmhubError, Result};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, ToString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
    Staff,
    Manager,
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl Role {
    /// Whether this role can open the dashboard belonging to `required`.
    ///
    /// Admins can see every dashboard, everyone else only their own
    pub fn can_access(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }
}

/// Server-assigned account identifier. It's opaque to the client, the
/// only thing done with it is echoing it back on profile updates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user's profile, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: AccountId,
    #[serde(alias = "name")]
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// The subset of the profile a user is allowed to edit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// What's actually sent to the API, the editable fields plus the account
/// they belong to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AccountId>,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    const MIN_NAME_LENGTH: usize = 2;

    /// Trims every field, blank optional fields become `None`
    pub fn validate(self) -> Result<Self> {
        let full_name = self.full_name.trim().to_owned();
        if full_name.chars().count() < Self::MIN_NAME_LENGTH {
            return Err(FarmhubError::BadRequest(format!(
                "full name must be at least {} characters",
                Self::MIN_NAME_LENGTH
            )));
        }
        Ok(Self {
            full_name,
            phone: non_blank(self.phone),
            address: non_blank(self.address),
        })
    }

    pub fn into_payload(self, id: Option<AccountId>) -> ProfileUpdatePayload {
        ProfileUpdatePayload {
            id,
            full_name: self.full_name,
            phone: self.phone,
            address: self.address,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
