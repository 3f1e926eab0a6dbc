//! tourscout-core — shared session model, gateway wire types, pacing, and config.
//! All other Tourscout crates depend on this one.

pub mod config;
pub mod pacing;
pub mod session;
pub mod wire;

pub use session::{
    Enrichment, HotelDescriptor, HotelId, SearchSession, SearchStatus, SearchToken, TourOffer,
};
