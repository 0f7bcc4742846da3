//! The API layer, containing web handlers and routing.

pub mod algo;
pub mod error;
pub mod handlers;
pub mod multitoken;
pub mod router;

pub use error::ApiError;
pub use handlers::ApiDoc;
pub use router::{RateLimitConfig, create_router, create_router_with_rate_limit};
