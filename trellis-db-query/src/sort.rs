//! Sort operation for enforcing result sort orders.
//!
//! `SortOperation` is a blocking operator: it materializes its child's
//! result, orders the rows lexicographically by the requested columns, and
//! hands out the reordered table. Operators that need a sort order from
//! their upstream (binary-search edge lookup, bound-side feeds) wrap the
//! upstream through [`sorted_variant`].

use crate::columns::{ColumnIndex, VariableColumns};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::operation::{Operation, PlanRef};
use crate::result::TableResult;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;
use trellis_db_core::{Id, IdTable};

/// Return `plan` unchanged when it already produces the requested sort
/// order, else wrap it in a [`SortOperation`].
pub fn sorted_variant(ctx: &ExecutionContext, plan: PlanRef, cols: Vec<ColumnIndex>) -> PlanRef {
    if plan.sorted_on().starts_with(&cols) {
        plan
    } else {
        Arc::new(SortOperation::new(ctx.clone(), plan, cols))
    }
}

/// Blocking sort of a child's result by a column list.
///
/// Rows compare by the requested columns first, then by the full row, so
/// the output order is deterministic for a given input.
pub struct SortOperation {
    ctx: ExecutionContext,
    child: PlanRef,
    cols: Vec<ColumnIndex>,
    variables: VariableColumns,
}

impl SortOperation {
    pub fn new(ctx: ExecutionContext, child: PlanRef, cols: Vec<ColumnIndex>) -> Self {
        let variables = child.variable_to_column_map().clone();
        Self {
            ctx,
            child,
            cols,
            variables,
        }
    }

    fn compare_rows(&self, table: &IdTable, a: usize, b: usize) -> Ordering {
        for &col in &self.cols {
            match table.get(a, col).cmp(&table.get(b, col)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        for col in 0..table.num_columns() {
            match table.get(a, col).cmp(&table.get(b, col)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl Operation for SortOperation {
    fn get_result(&self) -> Result<Arc<TableResult>> {
        let child = self.child.get_result()?;
        let input = child.table();
        let width = input.num_columns();

        let mut order: Vec<usize> = (0..input.num_rows()).collect();
        order.sort_unstable_by(|&a, &b| self.compare_rows(input, a, b));

        let mut table = IdTable::new(self.ctx.alloc.clone());
        table.set_num_columns(width);
        let mut row = vec![Id::from_bits(0); width];
        for &src in &order {
            self.ctx.cancel.check()?;
            for (col, slot) in row.iter_mut().enumerate() {
                *slot = input.get(src, col);
            }
            table.push_row(&row)?;
        }

        debug!(rows = order.len(), cols = ?self.cols, "sorted child result");
        Ok(Arc::new(TableResult::new(
            table,
            self.cols.clone(),
            child.vocab().clone(),
        )))
    }

    fn cache_key(&self) -> String {
        format!("Sort on {:?} ({})", self.cols, self.child.cache_key())
    }

    fn descriptor(&self) -> String {
        format!("Sort on columns {:?}", self.cols)
    }

    fn size_estimate(&self) -> usize {
        self.child.size_estimate()
    }

    fn cost_estimate(&self) -> usize {
        // The sort itself costs on the order of its input size.
        self.child.cost_estimate() + self.child.size_estimate()
    }

    fn sorted_on(&self) -> &[ColumnIndex] {
        &self.cols
    }

    fn known_empty_result(&self) -> bool {
        self.child.known_empty_result()
    }

    fn variable_to_column_map(&self) -> &VariableColumns {
        &self.variables
    }

    fn multiplicity(&self, col: ColumnIndex) -> f64 {
        self.child.multiplicity(col)
    }

    fn predicate(&self) -> Option<Id> {
        self.child.predicate()
    }
}
