//! Physical-operator contract.
//!
//! Every node of a physical plan implements [`Operation`]: it can
//! materialize its result on demand, describe itself for caching and
//! EXPLAIN output, and expose the estimates the planner uses to order
//! plans. Results are immutable and shared; estimates never fail and fall
//! back to documented defaults when information is missing.

use crate::columns::{ColumnIndex, VariableColumns};
use crate::error::Result;
use crate::result::TableResult;
use std::sync::Arc;
use trellis_db_core::Id;

/// Shared handle to a plan node.
pub type PlanRef = Arc<dyn Operation>;

/// A physical operator in a query plan.
pub trait Operation: Send + Sync {
    /// Materialize the result of this operator.
    ///
    /// Upstream failures propagate unchanged; no partial result is ever
    /// surfaced.
    fn get_result(&self) -> Result<Arc<TableResult>>;

    /// Deterministic key identifying this operator's output.
    ///
    /// Two operators with equal keys produce identical results on identical
    /// stores; differing configurations must differ in key.
    fn cache_key(&self) -> String;

    /// Human-readable one-line description (for EXPLAIN and logs).
    fn descriptor(&self) -> String;

    /// Estimated number of result rows. Advisory; never fails.
    fn size_estimate(&self) -> usize;

    /// Estimated total cost of computing this operator and its children.
    fn cost_estimate(&self) -> usize;

    /// Columns the result is sorted on, most significant first.
    fn sorted_on(&self) -> &[ColumnIndex];

    /// Whether the result is known to be empty without computing it.
    fn known_empty_result(&self) -> bool;

    /// Map from user-visible variables to output columns.
    fn variable_to_column_map(&self) -> &VariableColumns;

    /// Average number of rows per distinct value in `col`. 1.0 when unknown.
    fn multiplicity(&self, col: ColumnIndex) -> f64;

    /// The single predicate this operator scans, if it is an edge scan over
    /// one predicate. Used for descriptor strings only.
    fn predicate(&self) -> Option<Id> {
        None
    }
}
