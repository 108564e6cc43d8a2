//! Application services
//!
//! Everything handlers call besides order transitions and reviews:
//!
//! - [`AccountService`] - signup, login, session lookup
//! - [`CatalogService`] - seller products
//! - [`CartService`] - buyer cart, serialized per buyer
//! - [`CheckoutService`] - cart to PENDING order

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use accounts::{AccountService, LoginRequest, SignupRequest};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{CheckoutRequest, CheckoutService};

/// Lock key shared by cart writes and checkout
pub(crate) fn cart_key(buyer_id: &str) -> String {
    format!("cart:{buyer_id}")
}
