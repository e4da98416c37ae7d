//! HTTP surface for ParaSort: quick capture, classification preview and
//! note management over JSON.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorResponse, ServerError};
pub use routes::create_router;
pub use state::AppState;
