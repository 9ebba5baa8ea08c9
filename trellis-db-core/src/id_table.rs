//! Column-major id tables.
//!
//! [`IdTable`] is the tabular currency of the query layer: every column is a
//! contiguous `Vec<Id>`, rows exist only implicitly. Widths are known at
//! runtime; inner loops that benefit from compile-time-known column counts
//! convert to [`IdTableStatic`] / [`IdTableView`] with a const width
//! parameter (`W == 0` keeps the width dynamic and is the fallback for wide
//! tables).
//!
//! Growth is accounted against a [`MemoryTracker`]; the whole reservation is
//! released when the table drops.

use crate::id::Id;
use crate::tracking::{MemoryExceededError, MemoryReservation, MemoryTracker};

/// Mutable column-major table of 64-bit ids.
pub struct IdTable {
    columns: Vec<Vec<Id>>,
    num_rows: usize,
    reservation: MemoryReservation,
}

impl IdTable {
    /// Create an empty table drawing from `tracker`.
    pub fn new(tracker: MemoryTracker) -> Self {
        Self {
            columns: Vec::new(),
            num_rows: 0,
            reservation: MemoryReservation::new(tracker),
        }
    }

    /// Set the number of columns. Only valid while the table has no rows.
    pub fn set_num_columns(&mut self, width: usize) {
        debug_assert_eq!(self.num_rows, 0, "cannot change width of a filled table");
        self.columns = (0..width).map(|_| Vec::new()).collect();
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Immutable view of one column.
    #[inline]
    pub fn column(&self, col: usize) -> &[Id] {
        &self.columns[col]
    }

    /// Append a row. `row.len()` must equal the table width.
    pub fn push_row(&mut self, row: &[Id]) -> Result<(), MemoryExceededError> {
        debug_assert_eq!(row.len(), self.columns.len());
        self.reserve_row()?;
        for (column, &value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
        self.num_rows += 1;
        Ok(())
    }

    /// Append an all-zero row and return its index, for cell-wise writes.
    pub fn push_blank_row(&mut self) -> Result<usize, MemoryExceededError> {
        self.reserve_row()?;
        for column in &mut self.columns {
            column.push(Id::from_bits(0));
        }
        let row = self.num_rows;
        self.num_rows += 1;
        Ok(row)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Id) {
        self.columns[col][row] = value;
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Id {
        self.columns[col][row]
    }

    /// Materialize one row (test and debugging convenience).
    pub fn row(&self, row: usize) -> Vec<Id> {
        self.columns.iter().map(|c| c[row]).collect()
    }

    /// Convert into a width-specialized form. With `W > 0` the table must
    /// have exactly `W` columns; `W == 0` keeps the width dynamic.
    pub fn into_static<const W: usize>(self) -> IdTableStatic<W> {
        debug_assert!(W == 0 || self.columns.len() == W);
        IdTableStatic { inner: self }
    }

    /// Borrow as a width-specialized read-only view.
    pub fn as_static_view<const W: usize>(&self) -> IdTableView<'_, W> {
        debug_assert!(W == 0 || self.columns.len() == W);
        IdTableView { table: self }
    }

    #[inline]
    fn reserve_row(&mut self) -> Result<(), MemoryExceededError> {
        let bytes = (self.columns.len() * std::mem::size_of::<Id>()) as u64;
        self.reservation.grow(bytes)
    }
}

impl PartialEq for IdTable {
    fn eq(&self, other: &Self) -> bool {
        self.num_rows == other.num_rows && self.columns == other.columns
    }
}

impl std::fmt::Debug for IdTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdTable")
            .field("num_columns", &self.num_columns())
            .field("num_rows", &self.num_rows)
            .finish()
    }
}

/// Width-specialized mutable table. `W == 0` is the dynamic fallback.
///
/// The const width lets monomorphized inner loops run with a constant trip
/// count; storage and accounting are shared with [`IdTable`].
pub struct IdTableStatic<const W: usize> {
    inner: IdTable,
}

impl<const W: usize> IdTableStatic<W> {
    #[inline]
    pub fn num_columns(&self) -> usize {
        if W == 0 {
            self.inner.num_columns()
        } else {
            W
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.inner.num_rows
    }

    /// Append an all-zero row and return its index.
    pub fn push_blank_row(&mut self) -> Result<usize, MemoryExceededError> {
        self.inner.reserve_row()?;
        for col in 0..self.num_columns() {
            self.inner.columns[col].push(Id::from_bits(0));
        }
        let row = self.inner.num_rows;
        self.inner.num_rows += 1;
        Ok(row)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Id) {
        self.inner.columns[col][row] = value;
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Id {
        self.inner.columns[col][row]
    }

    /// Convert back to the dynamic-width form.
    pub fn into_dynamic(self) -> IdTable {
        self.inner
    }
}

/// Width-specialized read-only view borrowing an [`IdTable`].
#[derive(Clone, Copy)]
pub struct IdTableView<'a, const W: usize> {
    table: &'a IdTable,
}

impl<'a, const W: usize> IdTableView<'a, W> {
    #[inline]
    pub fn num_columns(&self) -> usize {
        if W == 0 {
            self.table.num_columns()
        } else {
            W
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.table.num_rows
    }

    #[inline]
    pub fn column(&self, col: usize) -> &'a [Id] {
        self.table.column(col)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Id {
        self.table.get(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(bits: u64) -> Id {
        Id::from_bits(bits)
    }

    #[test]
    fn test_push_and_access() {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(2);
        table.push_row(&[id(1), id(2)]).unwrap();
        table.push_row(&[id(3), id(4)]).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column(0), &[id(1), id(3)]);
        assert_eq!(table.get(1, 1), id(4));
        assert_eq!(table.row(0), vec![id(1), id(2)]);
    }

    #[test]
    fn test_blank_row_and_set() {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(3);
        let row = table.push_blank_row().unwrap();
        table.set(row, 0, id(7));
        table.set(row, 2, id(9));
        assert_eq!(table.row(row), vec![id(7), id(0), id(9)]);
    }

    #[test]
    fn test_static_round_trip() {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(2);
        table.push_row(&[id(1), id(2)]).unwrap();

        let mut fixed = table.into_static::<2>();
        assert_eq!(fixed.num_columns(), 2);
        let row = fixed.push_blank_row().unwrap();
        fixed.set(row, 0, id(5));
        fixed.set(row, 1, id(6));

        let dynamic = fixed.into_dynamic();
        assert_eq!(dynamic.num_rows(), 2);
        assert_eq!(dynamic.row(1), vec![id(5), id(6)]);
    }

    #[test]
    fn test_dynamic_fallback_width() {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(7);
        let mut wide = table.into_static::<0>();
        assert_eq!(wide.num_columns(), 7);
        wide.push_blank_row().unwrap();
        assert_eq!(wide.into_dynamic().num_rows(), 1);
    }

    #[test]
    fn test_view_access() {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(2);
        table.push_row(&[id(1), id(2)]).unwrap();

        let view = table.as_static_view::<2>();
        assert_eq!(view.num_columns(), 2);
        assert_eq!(view.num_rows(), 1);
        assert_eq!(view.get(0, 1), id(2));
        assert_eq!(view.column(0), &[id(1)]);
    }

    #[test]
    fn test_growth_is_accounted() {
        let tracker = MemoryTracker::with_limit(8 * 2 * 2);
        let mut table = IdTable::new(tracker.clone());
        table.set_num_columns(2);
        table.push_row(&[id(1), id(2)]).unwrap();
        table.push_row(&[id(3), id(4)]).unwrap();
        assert!(table.push_row(&[id(5), id(6)]).is_err());
        assert_eq!(table.num_rows(), 2);

        drop(table);
        assert_eq!(tracker.used(), 0);
    }
}
