//! Bidirectional codec between Training Center XML (TCX) and a generic
//! activity model.
//!
//! Decoding walks `Activities/Activity/Lap/Track/Trackpoint` into a flat,
//! ordered waypoint sequence with boundary markers; encoding re-partitions
//! that sequence into laps (re-deriving per-lap distance and duration) and
//! emits a schema-conformant document. Both directions are pure, single-pass
//! transformations with no state shared across calls.

pub mod distance;
pub mod error;
pub mod laps;
pub mod model;
pub mod parser;
pub mod writer;

pub use error::TcxError;
pub use model::{Activity, Location, Sport, Waypoint, WaypointKind};
pub use parser::{ParseMode, parse_tcx, parse_tcx_merged};
pub use writer::{write_tcx, write_tcx_with};
