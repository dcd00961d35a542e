pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod upstream;

pub use config::Config;
pub use error::{AppError, Result};
pub use gateway::{create_router, AppState};
