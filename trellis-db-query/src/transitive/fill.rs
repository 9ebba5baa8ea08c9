//! Result materialization from a computed hull.
//!
//! Width-specialized through the dispatch macros so the inner loops run with
//! compile-time-known column counts. The bound variant walks the bound-side
//! table row by row and copies its non-join columns behind the two endpoint
//! columns.

use crate::columns::ColumnIndex;
use crate::error::Result;
use crate::transitive::hull::Hull;
use trellis_db_core::{Id, IdTable, IdTableStatic, IdTableView};

/// Emit `(start, target)` for every hull entry. Used when the start side is
/// free or fixed; the output width is exactly two.
pub(crate) fn fill_unbound<const W: usize>(
    table: IdTable,
    hull: &Hull,
    start_col: ColumnIndex,
    target_col: ColumnIndex,
) -> Result<IdTable> {
    let mut out = table.into_static::<W>();
    for (&start, targets) in hull.iter() {
        for &target in targets {
            let row = out.push_blank_row()?;
            out.set(row, start_col, start);
            out.set(row, target_col, target);
        }
    }
    Ok(out.into_dynamic())
}

/// Emit rows for a bound start side.
///
/// `start_nodes` holds the join-column value of every bound-side row in row
/// order; rows whose value reached nothing in the hull emit nothing.
pub(crate) fn fill_bound<const W: usize, const SIDE_W: usize>(
    table: IdTable,
    hull: &Hull,
    start_nodes: &[Id],
    start_col: ColumnIndex,
    target_col: ColumnIndex,
    side_table: &IdTable,
    skip_col: ColumnIndex,
) -> Result<IdTable> {
    debug_assert_eq!(start_nodes.len(), side_table.num_rows());

    let side = side_table.as_static_view::<SIDE_W>();
    let mut out = table.into_static::<W>();

    for (side_row, &node) in start_nodes.iter().enumerate() {
        let Some(targets) = hull.targets(node) else {
            continue;
        };
        for &target in targets {
            let row = out.push_blank_row()?;
            out.set(row, start_col, node);
            out.set(row, target_col, target);
            copy_side_columns(&side, &mut out, side_row, row, skip_col);
        }
    }
    Ok(out.into_dynamic())
}

/// Copy the bound-side row into the output columns after the two endpoints,
/// in source order, skipping the join column.
fn copy_side_columns<const W: usize, const SIDE_W: usize>(
    side: &IdTableView<'_, SIDE_W>,
    out: &mut IdTableStatic<W>,
    side_row: usize,
    out_row: usize,
    skip_col: ColumnIndex,
) {
    let mut in_col = 0;
    let mut out_col = 2;
    while in_col < side.num_columns() && out_col < out.num_columns() {
        if in_col == skip_col {
            in_col += 1;
            continue;
        }
        out.set(out_row, out_col, side.get(side_row, in_col));
        in_col += 1;
        out_col += 1;
    }
}
