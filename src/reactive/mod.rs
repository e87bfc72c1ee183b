//! The reactive primitive underneath every observable value in the system.
//!
//! A [`Cell`] is a stateful, multi-source observable: it caches its last
//! published value, recomputes from its upstreams through a combine function,
//! and fans new values out to dynamically attached observers.
//!
//! # Key Properties
//!
//! - **Readiness gating**: a derived cell whose combine function returns
//!   `None` publishes nothing. This is how "no data yet" is kept distinct
//!   from any real value.
//! - **Per-cell serialization**: recomputation and fan-out for one cell never
//!   interleave; re-entrant emissions are queued and processed after the
//!   current fan-out finishes, so each cell has a total order of emissions.
//!   Sibling cells recompute independently of each other.
//! - **Hot vs single-shot**: a hot cell replays its cached value to a freshly
//!   attached observer; a single-shot cell never replays, so late subscribers
//!   see only emissions that happen after they attach.

pub mod cell;

pub use cell::{Cell, ObserverId, Upstream};
