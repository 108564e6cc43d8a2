//! User Model

use serde::{Deserialize, Serialize};

use super::identity::{Identity, Role};

/// Stored account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
    pub created_at: i64,
}

impl User {
    /// Identity for token issue. `None` when the stored role and ids disagree.
    pub fn identity(&self) -> Option<Identity> {
        match (self.role, &self.buyer_id, &self.seller_id) {
            (Role::Buyer, Some(buyer_id), None) => Some(Identity::Buyer {
                user_id: self.id.clone(),
                buyer_id: buyer_id.clone(),
            }),
            (Role::Seller, None, Some(seller_id)) => Some(Identity::Seller {
                user_id: self.id.clone(),
                seller_id: seller_id.clone(),
            }),
            (Role::Admin, None, None) => Some(Identity::Admin {
                user_id: self.id.clone(),
            }),
            _ => None,
        }
    }
}

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            buyer_id: user.buyer_id.clone(),
            seller_id: user.seller_id.clone(),
        }
    }
}

/// Issued session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_at: i64,
    pub user: UserInfo,
}
