//! Shared per-node trace logging (SPEC_FULL §10.2), kept separate from
//! `threadsim-core`/`threadsim-node` so the dispatcher can depend on
//! tracing machinery without the core event types depending on it.

pub mod entity_tracer;

pub use entity_tracer::{EntityTracer, EntityTracerConfig, TraceCategory, TraceEvent};
