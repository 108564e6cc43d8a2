//! Data models
//!
//! Shared between market-server and its clients (via API).
//! All IDs are UUID strings, all timestamps are Unix millis.

pub mod cart;
pub mod identity;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use cart::*;
pub use identity::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;
