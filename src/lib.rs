pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod service;

pub(crate) mod utils;

pub use error::CurationError;
pub use server::{CurationState, curation_router};
pub use service::EntityService;
