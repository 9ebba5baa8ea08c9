//! Endpoint descriptors for the transitive path operator.

use crate::columns::ColumnIndex;
use crate::operation::PlanRef;
use crate::var_registry::VarId;
use trellis_db_core::Id;

/// The value constraint of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideValue {
    /// A SPARQL variable (free, or bound through a feeding plan).
    Var(VarId),
    /// A single literal node id.
    Fixed(Id),
}

/// One endpoint of the path.
///
/// Records the endpoint's value constraint, the column of the edge relation
/// holding this side's ids, the output column they are written to, and the
/// feeding plan supplying admissible values when the side is bound.
#[derive(Clone)]
pub struct PathSide {
    pub value: SideValue,
    /// Column of the edge relation where this side's ids are located.
    pub sub_col: ColumnIndex,
    /// Output column this side's ids are written to. Assigned by the
    /// operator at construction.
    pub output_col: ColumnIndex,
    /// Feeding sub-plan and its join column. Only set when bound.
    pub feed: Option<(PlanRef, ColumnIndex)>,
}

impl PathSide {
    /// A variable endpoint reading its ids from `sub_col`.
    pub fn variable(var: VarId, sub_col: ColumnIndex) -> Self {
        Self {
            value: SideValue::Var(var),
            sub_col,
            output_col: 0,
            feed: None,
        }
    }

    /// A fixed-id endpoint.
    pub fn fixed(id: Id, sub_col: ColumnIndex) -> Self {
        Self {
            value: SideValue::Fixed(id),
            sub_col,
            output_col: 0,
            feed: None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.value, SideValue::Var(_))
    }

    pub fn is_bound(&self) -> bool {
        self.feed.is_some()
    }

    pub fn fixed_id(&self) -> Option<Id> {
        match self.value {
            SideValue::Fixed(id) => Some(id),
            SideValue::Var(_) => None,
        }
    }

    pub fn var(&self) -> Option<VarId> {
        match self.value {
            SideValue::Var(v) => Some(v),
            SideValue::Fixed(_) => None,
        }
    }

    /// Whether the feeding plan delivers its rows sorted on the join column.
    pub(crate) fn is_sorted_on_feed_col(&self) -> bool {
        self.feed
            .as_ref()
            .is_some_and(|(plan, col)| plan.sorted_on().first() == Some(col))
    }

    /// Deterministic cache-key fragment for this side.
    pub(crate) fn cache_key(&self) -> String {
        let mut key = match self.value {
            SideValue::Var(v) => format!("Var {v}"),
            SideValue::Fixed(id) => format!("Id {id}"),
        };
        key.push_str(&format!(", subCol {} -> outputCol {}", self.sub_col, self.output_col));
        if let Some((plan, col)) = &self.feed {
            key.push_str(&format!(", feed [{}] join col {col}", plan.cache_key()));
        }
        key
    }
}
