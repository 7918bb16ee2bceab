pub mod app_state;
pub mod asset_store;
pub mod config;
pub mod download;
pub mod error;
pub mod inference;
pub mod io_struct;
pub mod server;

pub use app_state::AppState;
pub use config::ServerConfig;
pub use error::{GenerationError, GenerationResult};
