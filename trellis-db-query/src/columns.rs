//! Variable-to-column maps for operator outputs.

use crate::var_registry::VarId;
use std::collections::HashMap;

/// Index of a column in a tabular result.
pub type ColumnIndex = usize;

/// Where a variable lives in an operator's output, and whether every row
/// defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column: ColumnIndex,
    pub always_defined: bool,
}

impl ColumnInfo {
    /// A column that is defined in every output row.
    pub fn always_defined(column: ColumnIndex) -> Self {
        Self {
            column,
            always_defined: true,
        }
    }
}

/// Map from user-visible variables to output columns.
pub type VariableColumns = HashMap<VarId, ColumnInfo>;
