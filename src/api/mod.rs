pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use router::build_router;
pub use types::ApiContext;
