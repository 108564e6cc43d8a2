//! Product reviews
//!
//! - **eligibility**: may this buyer review this product
//! - **service**: submit / update / delete with rating recomputation
//!
//! All writes for one product run under the `product:{id}` lock, so the
//! stored rating always equals the mean of the stored reviews.

pub mod eligibility;
mod error;
pub mod service;

pub use eligibility::can_review;
pub use error::ReviewError;
pub use service::ReviewService;
