//! # Trellis DB Core
//!
//! Shared primitives for the Trellis query engine:
//! - Opaque 64-bit node ids ([`Id`])
//! - Column-major id tables with width-specialized static forms ([`IdTable`])
//! - Byte-accounted memory tracking with a global limit ([`MemoryTracker`])
//! - Cooperative poll-style cancellation ([`CancelToken`])

pub mod cancel;
pub mod id;
pub mod id_table;
pub mod tracking;

pub use cancel::{CancelToken, CancelledError};
pub use id::Id;
pub use id_table::{IdTable, IdTableStatic, IdTableView};
pub use tracking::{MemoryExceededError, MemoryReservation, MemoryTracker};
