pub mod config;
pub mod error;
pub mod recommendation;
pub mod scoring;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{AdvisorError, AdvisorResult};
