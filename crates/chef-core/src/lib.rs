pub mod config;
pub mod error;
pub mod types;

pub use config::ChefConfig;
pub use error::{ChefError, Result};
pub use types::*;
