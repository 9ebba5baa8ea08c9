//! Transitive path operator.
//!
//! Given an edge relation produced by a sub-plan and two endpoint
//! descriptors, materializes all pairs of nodes connected by a path whose
//! length falls in `[min_dist, max_dist]` (SPARQL `+`/`*`/`{m,n}` property
//! paths over a single predicate).
//!
//! The computation proceeds in three phases, each timed into the operator's
//! runtime info:
//! 1. build an adjacency representation from the edge relation (hash map,
//!    or binary search over the pre-sorted relation);
//! 2. compute the hull from the start set chosen by [`decide_direction`]
//!    (bound feed, fixed id, or the relation's own start column);
//! 3. fill the output table, propagating bound-side columns.
//!
//! [`decide_direction`]: TransitivePath::decide_direction

mod dispatch;
mod edges;
mod fill;
mod hull;
mod side;

pub use side::{PathSide, SideValue};

use crate::columns::{ColumnIndex, ColumnInfo, VariableColumns};
use crate::context::ExecutionContext;
use crate::error::{QueryError, Result};
use crate::operation::{Operation, PlanRef};
use crate::result::{TableResult, Vocabulary};
use crate::runtime::RuntimeInfo;
use crate::sort::sorted_variant;
use crate::transitive::dispatch::{call_fixed_width, call_fixed_width_pair};
use crate::transitive::edges::{BinSearchEdges, HashEdges};
use crate::transitive::fill::{fill_bound, fill_unbound};
use crate::transitive::hull::transitive_hull;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use trellis_db_core::{Id, IdTable};

/// Which adjacency representation backs the hull computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAlgorithm {
    /// Hash map from source to target set, built per call.
    HashMap,
    /// Binary search over the edge relation sorted on (start, target).
    /// The operator requests that sort order from its upstream.
    BinSearch,
}

impl PathAlgorithm {
    fn tag(self) -> &'static str {
        match self {
            PathAlgorithm::HashMap => "HashMap",
            PathAlgorithm::BinSearch => "BinSearch",
        }
    }
}

/// Estimator defaults. Advisory values for the planner; not contracts.
#[derive(Debug, Clone, Copy)]
pub struct EstimateConfig {
    /// Assumed result size when either endpoint is a fixed id. Usually an
    /// overestimate, but it keeps plans from materializing large
    /// intermediates before merging with such a path.
    pub fixed_side_estimate: usize,
    /// Worst-case blow-up of the edge count when both endpoints are free.
    pub free_pair_blowup: usize,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            fixed_side_estimate: 1000,
            free_pair_blowup: 10_000,
        }
    }
}

/// Physical operator materializing the transitive closure of an edge
/// relation within a path-length window.
pub struct TransitivePath {
    ctx: ExecutionContext,
    subtree: PlanRef,
    lhs: PathSide,
    rhs: PathSide,
    min_dist: usize,
    max_dist: usize,
    result_width: usize,
    variable_columns: VariableColumns,
    sorted: Vec<ColumnIndex>,
    algorithm: PathAlgorithm,
    estimates: EstimateConfig,
    runtime: RuntimeInfo,
}

impl TransitivePath {
    /// Create the operator with an explicit back-end.
    ///
    /// A BinSearch operator wraps its edge sub-plan in a sort on
    /// `(start, target)` for the chosen direction; a HashMap operator takes
    /// the sub-plan as-is.
    pub fn new(
        ctx: ExecutionContext,
        subtree: PlanRef,
        mut lhs: PathSide,
        mut rhs: PathSide,
        min_dist: usize,
        max_dist: usize,
        algorithm: PathAlgorithm,
    ) -> Self {
        lhs.output_col = 0;
        rhs.output_col = 1;

        let mut op = Self {
            ctx,
            subtree,
            lhs,
            rhs,
            min_dist,
            max_dist,
            result_width: 2,
            variable_columns: VariableColumns::new(),
            sorted: Vec::new(),
            algorithm,
            estimates: EstimateConfig::default(),
            runtime: RuntimeInfo::new(),
        };

        if let SideValue::Var(v) = op.lhs.value {
            op.variable_columns.insert(v, ColumnInfo::always_defined(0));
        }
        if let SideValue::Var(v) = op.rhs.value {
            op.variable_columns.insert(v, ColumnInfo::always_defined(1));
        }
        op.extend_with_feed_columns();

        if op.algorithm == PathAlgorithm::BinSearch {
            let (start, target) = op.decide_direction();
            let cols = vec![start.sub_col, target.sub_col];
            op.subtree = sorted_variant(&op.ctx, op.subtree.clone(), cols);
        }

        op.sorted = op.compute_sorted_on();
        op
    }

    /// Create the operator, choosing the back-end from the sub-plan's sort
    /// order: binary search when the upstream already delivers
    /// `(start, target)` order (typical for index scans), hash map otherwise.
    pub fn for_subtree(
        ctx: ExecutionContext,
        subtree: PlanRef,
        lhs: PathSide,
        rhs: PathSide,
        min_dist: usize,
        max_dist: usize,
    ) -> Self {
        let (start, target) = if start_is_lhs(&lhs, &rhs) {
            (&lhs, &rhs)
        } else {
            (&rhs, &lhs)
        };
        let algorithm = if subtree.sorted_on().starts_with(&[start.sub_col, target.sub_col]) {
            PathAlgorithm::BinSearch
        } else {
            PathAlgorithm::HashMap
        };
        Self::new(ctx, subtree, lhs, rhs, min_dist, max_dist, algorithm)
    }

    /// Override the estimator defaults.
    pub fn with_estimates(mut self, estimates: EstimateConfig) -> Self {
        self.estimates = estimates;
        self
    }

    pub fn min_dist(&self) -> usize {
        self.min_dist
    }

    pub fn max_dist(&self) -> usize {
        self.max_dist
    }

    pub fn lhs(&self) -> &PathSide {
        &self.lhs
    }

    pub fn rhs(&self) -> &PathSide {
        &self.rhs
    }

    pub fn algorithm(&self) -> PathAlgorithm {
        self.algorithm
    }

    pub fn result_width(&self) -> usize {
        self.result_width
    }

    /// Metrics recorded by the last `get_result` call.
    pub fn runtime_info(&self) -> &RuntimeInfo {
        &self.runtime
    }

    /// Return a new operator whose left side is bound to `plan`: the values
    /// in its column `join_col` become the admissible left endpoints, and
    /// its remaining columns propagate into the output. The receiver is
    /// unchanged.
    pub fn bind_left_side(&self, plan: PlanRef, join_col: ColumnIndex) -> Self {
        self.bind_side(plan, join_col, true)
    }

    /// Mirror of [`TransitivePath::bind_left_side`] for the right side.
    pub fn bind_right_side(&self, plan: PlanRef, join_col: ColumnIndex) -> Self {
        self.bind_side(plan, join_col, false)
    }

    fn bind_side(&self, plan: PlanRef, join_col: ColumnIndex, is_left: bool) -> Self {
        // At most one side may be bound: the materializer has no emission
        // mode that joins two feeds.
        debug_assert!(
            if is_left { !self.rhs.is_bound() } else { !self.lhs.is_bound() },
            "at most one side of a transitive path may be bound"
        );

        let plan = sorted_variant(&self.ctx, plan, vec![join_col]);
        let mut lhs = self.lhs.clone();
        let mut rhs = self.rhs.clone();
        if is_left {
            lhs.feed = Some((plan, join_col));
        } else {
            rhs.feed = Some((plan, join_col));
        }

        Self::new(
            self.ctx.clone(),
            self.subtree.clone(),
            lhs,
            rhs,
            self.min_dist,
            self.max_dist,
            self.algorithm,
        )
    }

    /// Choose `(start, target)` among `(lhs, rhs)`.
    ///
    /// A bound side always drives the traversal: the materializer walks its
    /// feeder rows to propagate the extra columns (and when the other side
    /// is fixed, that id becomes the hull's target filter). Otherwise a
    /// fixed side wins (smallest possible start set), then the side with the
    /// smaller feeder estimate; ties favor `lhs`.
    pub fn decide_direction(&self) -> (&PathSide, &PathSide) {
        if start_is_lhs(&self.lhs, &self.rhs) {
            (&self.lhs, &self.rhs)
        } else {
            (&self.rhs, &self.lhs)
        }
    }

    fn extend_with_feed_columns(&mut self) {
        debug_assert!(
            !(self.lhs.is_bound() && self.rhs.is_bound()),
            "at most one side of a transitive path may be bound"
        );
        let Some((plan, join_col)) = self
            .lhs
            .feed
            .as_ref()
            .or(self.rhs.feed.as_ref())
            .cloned()
        else {
            return;
        };

        // Feeder columns land after the two endpoint columns, in source
        // order, skipping the join column.
        for (&var, info) in plan.variable_to_column_map() {
            if info.column == join_col {
                continue;
            }
            let column = if info.column > join_col {
                info.column + 1
            } else {
                info.column + 2
            };
            self.variable_columns.insert(
                var,
                ColumnInfo {
                    column,
                    always_defined: info.always_defined,
                },
            );
            self.result_width += 1;
        }
    }

    fn compute_sorted_on(&self) -> Vec<ColumnIndex> {
        let (start, _) = self.decide_direction();
        if start.is_sorted_on_feed_col() {
            vec![start.output_col]
        } else {
            Vec::new()
        }
    }

    /// The start set for the hull computation.
    ///
    /// Bound side: the feeder's join column, in row order. Fixed id: that id
    /// (suppressed for zero-length windows when it does not occur in the
    /// edge relation). Free variable: the relation's start column, plus the
    /// target column when zero-length paths are admissible.
    fn start_nodes(
        &self,
        sub: &IdTable,
        start: &PathSide,
        target: &PathSide,
        side: Option<(&TableResult, ColumnIndex)>,
    ) -> Vec<Id> {
        if let Some((side, join_col)) = side {
            return side.table().column(join_col).to_vec();
        }
        match start.value {
            SideValue::Fixed(id) => {
                if self.min_dist == 0
                    && !column_contains(sub, start.sub_col, id)
                    && !column_contains(sub, target.sub_col, id)
                {
                    // The reflexive pair is only admitted for nodes of the
                    // edge relation, and an absent node reaches nothing else.
                    Vec::new()
                } else {
                    vec![id]
                }
            }
            SideValue::Var(_) => {
                let mut nodes = sub.column(start.sub_col).to_vec();
                if self.min_dist == 0 {
                    nodes.extend_from_slice(sub.column(target.sub_col));
                }
                nodes
            }
        }
    }

    fn compute_result(&self) -> Result<TableResult> {
        if self.min_dist == 0
            && self.lhs.is_variable()
            && self.rhs.is_variable()
            && !self.lhs.is_bound()
            && !self.rhs.is_bound()
        {
            return Err(QueryError::UnsupportedEmptyPath);
        }

        let (start, target) = self.decide_direction();
        let (start, target) = (start.clone(), target.clone());

        let sub_res = self.subtree.get_result()?;
        let sub = sub_res.table();

        let side_res = match &start.feed {
            Some((plan, join_col)) => Some((plan.get_result()?, *join_col)),
            None => None,
        };

        debug!(
            algorithm = self.algorithm.tag(),
            edges = sub.num_rows(),
            min = self.min_dist,
            max = self.max_dist,
            bound = side_res.is_some(),
            "computing transitive path"
        );

        let build_start = Instant::now();
        let nodes = self.start_nodes(
            sub,
            &start,
            &target,
            side_res.as_ref().map(|(r, c)| (r.as_ref(), *c)),
        );
        let target_filter = target.fixed_id();

        let (hull, build_ms, hull_ms) = match self.algorithm {
            PathAlgorithm::HashMap => {
                let map = HashEdges::build(sub, start.sub_col, target.sub_col, &self.ctx)?;
                let build_ms = elapsed_ms(build_start);
                let hull_start = Instant::now();
                let hull = transitive_hull(
                    &map,
                    &nodes,
                    self.min_dist,
                    self.max_dist,
                    target_filter,
                    &self.ctx,
                )?;
                (hull, build_ms, elapsed_ms(hull_start))
            }
            PathAlgorithm::BinSearch => {
                let map = BinSearchEdges::new(sub, start.sub_col, target.sub_col);
                let build_ms = elapsed_ms(build_start);
                let hull_start = Instant::now();
                let hull = transitive_hull(
                    &map,
                    &nodes,
                    self.min_dist,
                    self.max_dist,
                    target_filter,
                    &self.ctx,
                )?;
                (hull, build_ms, elapsed_ms(hull_start))
            }
        };

        if let Some((side, _)) = &side_res {
            if nodes.len() != side.table().num_rows() {
                return Err(QueryError::internal(
                    "bound-side start nodes out of sync with feeder rows",
                ));
            }
        }

        let fill_start = Instant::now();
        let mut out = IdTable::new(self.ctx.alloc.clone());
        out.set_num_columns(self.result_width);

        let table = match &side_res {
            Some((side, join_col)) => {
                let side_table = side.table();
                call_fixed_width_pair!(
                    (self.result_width, side_table.num_columns()),
                    fill_bound(
                        out,
                        &hull,
                        &nodes,
                        start.output_col,
                        target.output_col,
                        side_table,
                        *join_col,
                    )
                )?
            }
            None => call_fixed_width!(
                self.result_width,
                fill_unbound(out, &hull, start.output_col, target.output_col)
            )?,
        };

        self.runtime.add_detail("Edge map build time", build_ms);
        self.runtime.add_detail("Hull time", hull_ms);
        self.runtime.add_detail("Table fill time", elapsed_ms(fill_start));
        self.runtime.add_detail("Hull starts", hull.num_starts());

        let vocab = match &side_res {
            Some((side, _)) => Vocabulary::merge_non_empty(side.vocab(), sub_res.vocab()),
            None => sub_res.vocab().clone(),
        };

        Ok(TableResult::new(table, self.sorted.clone(), vocab))
    }

    fn side_name(&self, side: &PathSide) -> String {
        match side.value {
            SideValue::Var(v) => v.to_string(),
            SideValue::Fixed(id) => self.ctx.printer.lexical(id),
        }
    }
}

impl Operation for TransitivePath {
    fn get_result(&self) -> Result<Arc<TableResult>> {
        Ok(Arc::new(self.compute_result()?))
    }

    fn cache_key(&self) -> String {
        format!(
            "TransitivePath({}) minDist {} maxDist {} lhs [{}] rhs [{}] sub [{}]",
            self.algorithm.tag(),
            self.min_dist,
            self.max_dist,
            self.lhs.cache_key(),
            self.rhs.cache_key(),
            self.subtree.cache_key(),
        )
    }

    fn descriptor(&self) -> String {
        let mut out = String::from("TransitivePath ");
        // Only show the interval when it is not the full `+` hull.
        if self.min_dist > 1 || self.max_dist < usize::MAX {
            out.push_str(&format!("[{}, {}] ", self.min_dist, self.max_dist));
        }
        out.push_str(&self.side_name(&self.lhs));
        match self.subtree.predicate() {
            Some(p) => {
                out.push(' ');
                out.push_str(&self.ctx.printer.lexical(p));
                out.push(' ');
            }
            None => out.push_str(" <???> "),
        }
        out.push_str(&self.side_name(&self.rhs));
        out
    }

    fn size_estimate(&self) -> usize {
        if !self.lhs.is_variable() || !self.rhs.is_variable() {
            return self.estimates.fixed_side_estimate;
        }
        if let Some((plan, _)) = &self.lhs.feed {
            return plan.size_estimate();
        }
        if let Some((plan, _)) = &self.rhs.feed {
            return plan.size_estimate();
        }
        // Both endpoints free: assume the worst-case blow-up of the edge
        // count, so plans only compute the full hull when nothing else
        // constrains these variables.
        self.subtree
            .size_estimate()
            .saturating_mul(self.estimates.free_pair_blowup)
    }

    fn cost_estimate(&self) -> usize {
        let mut cost = self
            .size_estimate()
            .saturating_add(self.subtree.cost_estimate());
        for side in [&self.lhs, &self.rhs] {
            if let Some((plan, _)) = &side.feed {
                cost = cost.saturating_add(plan.cost_estimate());
            }
        }
        cost
    }

    fn sorted_on(&self) -> &[ColumnIndex] {
        &self.sorted
    }

    fn known_empty_result(&self) -> bool {
        self.subtree.known_empty_result()
    }

    fn variable_to_column_map(&self) -> &VariableColumns {
        &self.variable_columns
    }

    fn multiplicity(&self, _col: ColumnIndex) -> f64 {
        // The multiplicities of the hull are not known.
        1.0
    }
}

fn start_is_lhs(lhs: &PathSide, rhs: &PathSide) -> bool {
    if lhs.is_bound() != rhs.is_bound() {
        return lhs.is_bound();
    }
    if lhs.is_variable() != rhs.is_variable() {
        return !lhs.is_variable();
    }
    match (&lhs.feed, &rhs.feed) {
        (Some((l, _)), Some((r, _))) => l.size_estimate() <= r.size_estimate(),
        _ => true,
    }
}

fn column_contains(table: &IdTable, col: ColumnIndex, id: Id) -> bool {
    table.column(col).contains(&id)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
