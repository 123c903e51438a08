pub mod response;
mod router;
pub mod token;
pub mod validation;

pub use router::{AppState, create_router};
