pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use router::app_router;
pub use types::ApiContext;
