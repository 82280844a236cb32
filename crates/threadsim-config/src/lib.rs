//! Typed, `serde`-backed scenario configuration (SPEC_FULL §10.3). The
//! YAML grammar and its interactive editing remain out of scope (§1);
//! this crate only loads and validates a [`config::SimulationConfig`]
//! and hands it to `threadsim-runner`.

pub mod config;
pub mod error;
pub mod value;

pub use config::{NodeSpec, RadioModelConfigSpec, SimulationConfig};
pub use error::{ConfigError, ConfigResult};
pub use value::{FromPropertyValue, PropertyValue, ToPropertyValue};
