//! Pluggable radio propagation models (SPEC_FULL §4.3): shared RSSI/path
//! loss math in [`params`], per-variant errors in [`error`], and the
//! tagged-variant [`model::RadioModel`] itself.

pub mod error;
pub mod model;
pub mod params;

pub use error::{RadioError, RadioResult};
pub use model::{CommStartRegistration, RadioModel, RadioModelConfig, RadioModelKind};
pub use params::{
    clamp_rssi, path_loss_db, round_half_away_from_zero, rssi_at_distance, Position, RadioParams,
    IDEAL_DISC_METERS_PER_UNIT, PATH_LOSS_MIN_DISTANCE_M, RSSI_MINUS_INFINITY,
};
