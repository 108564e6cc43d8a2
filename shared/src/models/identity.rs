//! Identity Model
//!
//! The resolved caller of a request. Built once from the identity token and
//! passed explicitly to every operation that needs to know who is acting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "BUYER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }

    /// Landing page for this role
    pub const fn home_path(&self) -> &'static str {
        match self {
            Role::Buyer => "/buyer",
            Role::Seller => "/seller",
            Role::Admin => "/admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Role::Buyer),
            "SELLER" => Ok(Role::Seller),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Resolved caller identity
///
/// A buyer always carries a buyer id, a seller always carries a seller id and
/// an admin carries neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "role",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Identity {
    Buyer { user_id: String, buyer_id: String },
    Seller { user_id: String, seller_id: String },
    Admin { user_id: String },
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Buyer { .. } => Role::Buyer,
            Identity::Seller { .. } => Role::Seller,
            Identity::Admin { .. } => Role::Admin,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Identity::Buyer { user_id, .. }
            | Identity::Seller { user_id, .. }
            | Identity::Admin { user_id } => user_id,
        }
    }

    pub fn buyer_id(&self) -> Option<&str> {
        match self {
            Identity::Buyer { buyer_id, .. } => Some(buyer_id),
            _ => None,
        }
    }

    pub fn seller_id(&self) -> Option<&str> {
        match self {
            Identity::Seller { seller_id, .. } => Some(seller_id),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::Admin { .. })
    }

    pub fn home_path(&self) -> &'static str {
        self.role().home_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_home_paths() {
        assert_eq!(Role::Buyer.home_path(), "/buyer");
        assert_eq!(Role::Seller.home_path(), "/seller");
        assert_eq!(Role::Admin.home_path(), "/admin");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("SELLER".parse::<Role>(), Ok(Role::Seller));
        assert_eq!("buyer".parse::<Role>(), Ok(Role::Buyer));
        assert!("GUEST".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_accessors() {
        let buyer = Identity::Buyer {
            user_id: "u1".into(),
            buyer_id: "b1".into(),
        };
        assert_eq!(buyer.role(), Role::Buyer);
        assert_eq!(buyer.buyer_id(), Some("b1"));
        assert_eq!(buyer.seller_id(), None);
        assert!(!buyer.is_admin());

        let admin = Identity::Admin { user_id: "a".into() };
        assert_eq!(admin.buyer_id(), None);
        assert_eq!(admin.seller_id(), None);
        assert_eq!(admin.home_path(), "/admin");
    }

    #[test]
    fn test_identity_serde_shape() {
        let seller = Identity::Seller {
            user_id: "u2".into(),
            seller_id: "s2".into(),
        };
        let json = serde_json::to_value(&seller).unwrap();
        assert_eq!(json["role"], "SELLER");
        assert_eq!(json["userId"], "u2");
        assert_eq!(json["sellerId"], "s2");

        let back: Identity = serde_json::from_value(json).unwrap();
        assert_eq!(back, seller);
    }
}
