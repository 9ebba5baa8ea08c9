//! # Trellis DB Query
//!
//! Physical query operators for Trellis DB.
//!
//! This crate provides:
//! - The [`Operation`] contract shared by all plan nodes (materialized
//!   results, cache keys, planner estimates, sortedness)
//! - The transitive path operator ([`TransitivePath`]) computing SPARQL
//!   `+`/`*`/`{m,n}` property paths over an edge relation
//! - Leaf and utility operations ([`ValuesOperation`], [`SortOperation`])
//!
//! ## Quick Start
//!
//! Build an edge relation with [`ValuesOperation`], describe the two
//! endpoints with [`PathSide`], and call `get_result` on a
//! [`TransitivePath`] constructed over them.

pub mod columns;
pub mod context;
pub mod error;
pub mod operation;
pub mod result;
pub mod runtime;
pub mod sort;
pub mod transitive;
pub mod values;
pub mod var_registry;

// Re-exports
pub use columns::{ColumnIndex, ColumnInfo, VariableColumns};
pub use context::ExecutionContext;
pub use error::{QueryError, Result};
pub use operation::{Operation, PlanRef};
pub use result::{TableResult, Vocabulary};
pub use runtime::RuntimeInfo;
pub use sort::{sorted_variant, SortOperation};
pub use transitive::{EstimateConfig, PathAlgorithm, PathSide, SideValue, TransitivePath};
pub use values::ValuesOperation;
pub use var_registry::{VarId, VarRegistry};

// Re-export from trellis-db-core for convenience
pub use trellis_db_core::{CancelToken, Id, IdTable, MemoryTracker};
