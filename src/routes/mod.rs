mod payment;

pub use payment::PaymentCallback;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;

use crate::models::{Role, User};

/// Characters escaped when a product title is put into a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    News,
    PrivacyPolicy,
    Products,
    ProductDetail { title: String },
    Cart,
    Checkout,
    OrderSuccess,
    OrderFailure,
    PaymentCallback,
    Login,
    Register,
    Profile,
    /// `/admin`, `/staff` and `/manager`, everything below the root is
    /// kept as the section
    Dashboard { role: Role, section: Option<String> },
    NotFound { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RequiresLogin,
    Forbidden,
}

impl Route {
    /// Resolves a location (path plus optional query/fragment) to a route
    pub fn parse(location: &str) -> Self {
        let path = location
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["about"] => Self::About,
            ["news"] => Self::News,
            ["privacy-policy"] => Self::PrivacyPolicy,
            ["products"] => Self::Products,
            ["products", title] => Self::ProductDetail {
                title: (*title).to_string(),
            },
            ["cart"] => Self::Cart,
            ["checkout"] => Self::Checkout,
            ["order-success"] => Self::OrderSuccess,
            ["order-failure"] => Self::OrderFailure,
            ["payment-callback"] => Self::PaymentCallback,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["profile"] => Self::Profile,
            [root, rest @ ..] => match dashboard_role(root) {
                Some(role) => Self::Dashboard {
                    role,
                    section: if rest.is_empty() {
                        None
                    } else {
                        Some(rest.join("/"))
                    },
                },
                None => Self::NotFound {
                    path: path.to_string(),
                },
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::About => "/about".into(),
            Self::News => "/news".into(),
            Self::PrivacyPolicy => "/privacy-policy".into(),
            Self::Products => "/products".into(),
            Self::ProductDetail { title } => {
                format!("/products/{}", utf8_percent_encode(title, SEGMENT))
            }
            Self::Cart => "/cart".into(),
            Self::Checkout => "/checkout".into(),
            Self::OrderSuccess => "/order-success".into(),
            Self::OrderFailure => "/order-failure".into(),
            Self::PaymentCallback => "/payment-callback".into(),
            Self::Login => "/login".into(),
            Self::Register => "/register".into(),
            Self::Profile => "/profile".into(),
            Self::Dashboard { role, section } => match section {
                Some(section) => format!("/{}/{}", role.to_string(), section),
                None => format!("/{}", role.to_string()),
            },
            Self::NotFound { path } => path.clone(),
        }
    }

    /// Whether `user` may open this route
    pub fn access_for(&self, user: Option<&User>) -> Access {
        match (self, user) {
            (Self::Checkout, None) | (Self::Profile, None) | (Self::Dashboard { .. }, None) => {
                Access::RequiresLogin
            }
            (Self::Dashboard { role, .. }, Some(user)) if !user.role.can_access(*role) => {
                Access::Forbidden
            }
            _ => Access::Granted,
        }
    }

    /// The route to actually render: itself when access is granted,
    /// otherwise login for anonymous users and home for everyone else
    pub fn resolve(self, user: Option<&User>) -> Self {
        match self.access_for(user) {
            Access::Granted => self,
            Access::RequiresLogin => Self::Login,
            Access::Forbidden => Self::Home,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn dashboard_role(segment: &str) -> Option<Role> {
    match segment {
        "admin" => Some(Role::Admin),
        "staff" => Some(Role::Staff),
        "manager" => Some(Role::Manager),
        _ => None,
    }
}
