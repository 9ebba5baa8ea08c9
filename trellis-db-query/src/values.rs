//! VALUES operation - a leaf plan over explicit rows.
//!
//! Wraps a constant row set behind the [`Operation`] contract. This is how
//! bound-side feeds and test edge relations enter a plan without an index
//! scan.

use crate::columns::{ColumnIndex, ColumnInfo, VariableColumns};
use crate::context::ExecutionContext;
use crate::error::{QueryError, Result};
use crate::operation::Operation;
use crate::result::{TableResult, Vocabulary};
use crate::var_registry::VarId;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use trellis_db_core::{Id, IdTable};

/// Leaf operation over an explicit table of ids.
pub struct ValuesOperation {
    result: Arc<TableResult>,
    variables: VariableColumns,
    sorted: Vec<ColumnIndex>,
    /// Distinct value count per column, for multiplicity estimates.
    distinct: Vec<usize>,
    num_rows: usize,
    cache_key: String,
}

impl ValuesOperation {
    /// Create a VALUES operation binding `vars` (in column order) to `rows`.
    pub fn new(ctx: &ExecutionContext, vars: Vec<VarId>, rows: Vec<Vec<Id>>) -> Result<Self> {
        Self::with_vocabulary(ctx, vars, rows, Vocabulary::empty())
    }

    /// Like [`ValuesOperation::new`], with a shared vocabulary attached to
    /// the result.
    pub fn with_vocabulary(
        ctx: &ExecutionContext,
        vars: Vec<VarId>,
        rows: Vec<Vec<Id>>,
        vocab: Vocabulary,
    ) -> Result<Self> {
        let width = vars.len();

        for (i, &var) in vars.iter().enumerate() {
            if vars.iter().take(i).any(|&v| v == var) {
                return Err(QueryError::InvalidQuery(format!(
                    "duplicate variable {var} in VALUES"
                )));
            }
        }
        for row in &rows {
            if row.len() != width {
                return Err(QueryError::InvalidQuery(format!(
                    "VALUES row has {} entries, expected {width}",
                    row.len()
                )));
            }
        }

        let mut table = IdTable::new(ctx.alloc.clone());
        table.set_num_columns(width);
        for row in &rows {
            table.push_row(row)?;
        }

        // Report sortedness when the rows happen to be lexicographically
        // ordered, so downstream operators can skip their own sort.
        let lex_sorted = width > 0 && rows.windows(2).all(|w| w[0] <= w[1]);
        let sorted: Vec<ColumnIndex> = if lex_sorted { (0..width).collect() } else { Vec::new() };

        let distinct = (0..width)
            .map(|col| rows.iter().map(|r| r[col]).collect::<HashSet<_>>().len())
            .collect();

        let variables: VariableColumns = vars
            .iter()
            .enumerate()
            .map(|(col, &var)| (var, ColumnInfo::always_defined(col)))
            .collect();

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for row in &rows {
            for id in row {
                id.bits().hash(&mut hasher);
            }
        }
        let cache_key = format!("Values {}x{} #{:016x}", width, rows.len(), hasher.finish());

        let num_rows = rows.len();
        Ok(Self {
            result: Arc::new(TableResult::new(table, sorted.clone(), vocab)),
            variables,
            sorted,
            distinct,
            num_rows,
            cache_key,
        })
    }
}

impl Operation for ValuesOperation {
    fn get_result(&self) -> Result<Arc<TableResult>> {
        Ok(self.result.clone())
    }

    fn cache_key(&self) -> String {
        self.cache_key.clone()
    }

    fn descriptor(&self) -> String {
        format!("Values ({} rows)", self.num_rows)
    }

    fn size_estimate(&self) -> usize {
        self.num_rows
    }

    fn cost_estimate(&self) -> usize {
        self.num_rows
    }

    fn sorted_on(&self) -> &[ColumnIndex] {
        &self.sorted
    }

    fn known_empty_result(&self) -> bool {
        self.num_rows == 0
    }

    fn variable_to_column_map(&self) -> &VariableColumns {
        &self.variables
    }

    fn multiplicity(&self, col: ColumnIndex) -> f64 {
        match self.distinct.get(col) {
            Some(&d) if d > 0 => self.num_rows as f64 / d as f64,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(bits: u64) -> Id {
        Id::from_bits(bits)
    }

    #[test]
    fn test_sorted_detection() {
        let ctx = ExecutionContext::new();
        let sorted = ValuesOperation::new(
            &ctx,
            vec![VarId(0), VarId(1)],
            vec![vec![id(1), id(2)], vec![id(1), id(3)], vec![id(2), id(1)]],
        )
        .unwrap();
        assert_eq!(sorted.sorted_on(), &[0, 1]);

        let unsorted = ValuesOperation::new(
            &ctx,
            vec![VarId(0), VarId(1)],
            vec![vec![id(2), id(1)], vec![id(1), id(3)]],
        )
        .unwrap();
        assert!(unsorted.sorted_on().is_empty());
    }

    #[test]
    fn test_multiplicity_and_estimates() {
        let ctx = ExecutionContext::new();
        let op = ValuesOperation::new(
            &ctx,
            vec![VarId(0), VarId(1)],
            vec![
                vec![id(1), id(10)],
                vec![id(1), id(11)],
                vec![id(2), id(12)],
                vec![id(2), id(13)],
            ],
        )
        .unwrap();

        assert_eq!(op.size_estimate(), 4);
        assert!(!op.known_empty_result());
        assert_eq!(op.multiplicity(0), 2.0);
        assert_eq!(op.multiplicity(1), 1.0);
    }

    #[test]
    fn test_cache_key_depends_on_content() {
        let ctx = ExecutionContext::new();
        let a = ValuesOperation::new(&ctx, vec![VarId(0)], vec![vec![id(1)]]).unwrap();
        let b = ValuesOperation::new(&ctx, vec![VarId(0)], vec![vec![id(1)]]).unwrap();
        let c = ValuesOperation::new(&ctx, vec![VarId(0)], vec![vec![id(2)]]).unwrap();

        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let ctx = ExecutionContext::new();
        let err = ValuesOperation::new(&ctx, vec![VarId(0), VarId(1)], vec![vec![id(1)]]);
        assert!(matches!(err, Err(QueryError::InvalidQuery(_))));
    }
}
