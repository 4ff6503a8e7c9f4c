pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod validation;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};
