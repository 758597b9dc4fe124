pub mod router;
pub mod routes;

pub use router::{CurationState, cors_layer, curation_router};
