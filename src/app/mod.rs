//! Application layer containing business logic and shared state.

pub mod algo_service;
pub mod dispatch;
pub mod multitoken_service;
pub mod state;
pub mod units;

pub use algo_service::AlgoService;
pub use dispatch::{Dispatcher, MULTI_TOKEN_CHAINS, PreparationTable};
pub use multitoken_service::MultiTokenService;
pub use state::AppState;
pub use units::format_units;
