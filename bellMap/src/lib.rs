// Main module declarations for bellmap

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod app_config;
}

// Model definitions
pub mod models {
    pub mod bell;
    pub mod viewport;
}

// Data loaders
pub mod data {
    pub mod poi;
    pub mod bells_loader;
    pub mod gazetteer;
}

// Spatial queries
pub mod core {
    pub mod distance;
    pub mod proximity_index;
    pub mod grid_index;
    pub mod query_facade;
    pub mod highlight_timer;
}

// External collaborators
pub mod services {
    pub mod geolocation;
    pub mod place_search;
}

// Analysis and presentation
pub mod analysis {
    pub mod stats;
    pub mod reporting;
    pub mod presentation;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
    pub mod batch;
}

// CLI interface
pub mod cli {
    pub mod cli;
    pub mod session;
}

// Re-export commonly used modules
pub use crate::core::distance::haversine_km;
pub use crate::core::proximity_index::{CategoryFilter, LinearIndex, SpatialQuery};
pub use crate::core::grid_index::GridIndex;
pub use crate::core::query_facade::QueryFacade;
pub use crate::data::bells_loader::DataFormatError;
pub use crate::data::poi::Coordinate;
pub use crate::models::bell::Bell;
