use std::sync::Arc;

use datafusion_common::tree_node::TreeNode;
use datafusion_common::{Column, DFSchema};
use datafusion_expr::expr::Sort;
use datafusion_expr::{logical_plan, Expr, ExprSchemable, Extension, LogicalPlan, Projection};
use log::{debug, trace};
use sail_logical_plan::repartition::ExplicitRepartitionNode;
use sail_logical_plan::sort::SortWithinPartitionsNode;

use crate::argument::{
    CallArgument, DirectiveClause, PlannedArgument, PlannedArguments, TableArgument,
    TableArgumentRequirement,
};
use crate::error::{PlanError, PlanResult};
use crate::resolver::state::PlanResolverState;
use crate::resolver::PlanResolver;

/// Tracks where the directive expressions of one table argument land
/// in the flattened row of the function input.
struct DirectiveColumns<'a> {
    schema: &'a DFSchema,
    /// The position of the table argument in the function call.
    position: usize,
    /// The index of the first column of the table argument in the flattened row.
    offset: usize,
    /// The expressions appended to the relation, aliased with opaque field names.
    computed: Vec<Expr>,
    child_indexes: Vec<usize>,
}

impl<'a> DirectiveColumns<'a> {
    fn new(schema: &'a DFSchema, position: usize, offset: usize) -> Self {
        Self {
            schema,
            position,
            offset,
            computed: vec![],
            child_indexes: vec![],
        }
    }

    /// Resolves a directive expression to a column of the (possibly projected) relation
    /// and records its index.
    /// A column of the relation is referenced as is. Any other expression is appended
    /// as a new column, even if the same expression has been appended before.
    fn resolve(
        &mut self,
        expr: Expr,
        clause: DirectiveClause,
        state: &mut PlanResolverState,
    ) -> PlanResult<Expr> {
        let expr = expr.unalias();
        if let Expr::Column(column) = &expr {
            if let Some(index) = self.schema.maybe_index_of_column(column) {
                let field = self.schema.qualified_field(index);
                self.child_indexes.push(self.offset + index);
                return Ok(Expr::Column(Column::from(field)));
            }
        }
        self.check_computed(&expr, clause)?;
        let rank = self.computed.len();
        let name = state.register_field(clause.column_name(rank));
        let index = self.offset + self.schema.fields().len() + rank;
        self.child_indexes.push(index);
        self.computed.push(expr.alias(name.clone()));
        Ok(Expr::Column(Column::new_unqualified(name)))
    }

    #[allow(deprecated)]
    fn check_computed(&self, expr: &Expr, clause: DirectiveClause) -> PlanResult<()> {
        let unresolved = |message: String| PlanError::unresolved(self.position, clause, message);
        let invalid = expr.exists(|e| match e {
            Expr::Wildcard { .. }
            | Expr::Placeholder(_)
            | Expr::AggregateFunction(_)
            | Expr::WindowFunction(_) => Ok(true),
            _ => Ok(false),
        })?;
        if invalid {
            return Err(unresolved(format!(
                "{expr} cannot be used as a partitioning or ordering expression"
            )));
        }
        expr.get_type(self.schema)
            .map_err(|e| unresolved(format!("{expr}: {e}")))?;
        Ok(())
    }
}

impl PlanResolver {
    /// Plans the arguments of a table-valued function call.
    ///
    /// Each table argument is rewritten to deliver its rows with the partitioning
    /// and ordering required by its directives. The returned child indexes locate
    /// the `PARTITION BY` and then `ORDER BY` expressions of every table argument
    /// in the flattened row, where each scalar argument takes one slot and each
    /// table argument takes as many slots as the columns of its rewritten relation.
    pub fn plan_arguments(
        &self,
        arguments: Vec<CallArgument>,
        state: &mut PlanResolverState,
    ) -> PlanResult<PlannedArguments> {
        let num_tables = arguments.iter().filter(|x| x.is_table()).count();
        if num_tables > 1 && !self.config.allow_multiple_table_arguments {
            return Err(PlanError::invalid(format!(
                "a table-valued function call accepts at most one table argument, got {num_tables}"
            )));
        }
        let mut offset = 0;
        let mut planned = Vec::with_capacity(arguments.len());
        let mut child_indexes = vec![];
        for (position, argument) in arguments.into_iter().enumerate() {
            let argument = match argument {
                CallArgument::Scalar(expr) => PlannedArgument::Scalar(expr),
                CallArgument::Table(table) => {
                    let (plan, table_indexes) =
                        self.plan_table_argument(table, position, offset, state)?;
                    child_indexes.extend_from_slice(&table_indexes);
                    PlannedArgument::Table {
                        plan,
                        child_indexes: table_indexes,
                    }
                }
            };
            offset += argument.width();
            planned.push(argument);
        }
        trace!("table-valued function child indexes: {child_indexes:?}");
        Ok(PlannedArguments {
            arguments: planned,
            child_indexes,
        })
    }

    /// Plans the arguments with the partitioning and ordering that the function
    /// itself requires for its table argument.
    pub fn plan_arguments_with_requirement(
        &self,
        arguments: Vec<CallArgument>,
        requirement: &TableArgumentRequirement,
        state: &mut PlanResolverState,
    ) -> PlanResult<PlannedArguments> {
        let num_tables = arguments.iter().filter(|x| x.is_table()).count();
        if num_tables > 1 && !requirement.is_empty() {
            return Err(PlanError::invalid(format!(
                "the function requirement applies to a single table argument, got {num_tables}"
            )));
        }
        let arguments = arguments
            .into_iter()
            .enumerate()
            .map(|(position, argument)| match argument {
                CallArgument::Table(table) => Ok(CallArgument::Table(
                    table.with_requirement(requirement, position)?,
                )),
                x @ CallArgument::Scalar(_) => Ok(x),
            })
            .collect::<PlanResult<Vec<_>>>()?;
        self.plan_arguments(arguments, state)
    }

    fn plan_table_argument(
        &self,
        argument: TableArgument,
        position: usize,
        offset: usize,
        state: &mut PlanResolverState,
    ) -> PlanResult<(Arc<LogicalPlan>, Vec<usize>)> {
        argument.validate(position)?;
        let TableArgument {
            plan,
            partition_by,
            order_by,
            with_single_partition,
        } = argument;
        let schema = plan.schema().clone();
        let mut columns = DirectiveColumns::new(&schema, position, offset);
        let partition_by = partition_by
            .into_iter()
            .map(|expr| columns.resolve(expr, DirectiveClause::PartitionBy, state))
            .collect::<PlanResult<Vec<_>>>()?;
        let order_by = order_by
            .into_iter()
            .map(|sort| {
                let Sort {
                    expr,
                    asc,
                    nulls_first,
                } = sort;
                let expr = columns.resolve(expr, DirectiveClause::OrderBy, state)?;
                Ok(Sort {
                    expr,
                    asc,
                    nulls_first,
                })
            })
            .collect::<PlanResult<Vec<_>>>()?;
        let DirectiveColumns {
            computed,
            child_indexes,
            ..
        } = columns;
        debug!(
            "table argument at position {position} with offset {offset}: {} computed column(s), child indexes {child_indexes:?}",
            computed.len()
        );

        let plan = if computed.is_empty() {
            plan
        } else {
            let projections = schema
                .columns()
                .into_iter()
                .map(Expr::Column)
                .chain(computed)
                .collect::<Vec<_>>();
            Arc::new(LogicalPlan::Projection(Projection::try_new(
                projections,
                plan,
            )?))
        };
        let plan = if with_single_partition {
            Arc::new(LogicalPlan::Extension(Extension {
                node: Arc::new(ExplicitRepartitionNode::single(plan)),
            }))
        } else if !partition_by.is_empty() {
            Arc::new(LogicalPlan::Extension(Extension {
                node: Arc::new(ExplicitRepartitionNode::hash(
                    plan,
                    partition_by,
                    self.config.hash_partitions,
                )?),
            }))
        } else {
            plan
        };
        let plan = if order_by.is_empty() {
            plan
        } else if with_single_partition {
            // All rows are in one partition so the sort gives a total order.
            Arc::new(LogicalPlan::Sort(logical_plan::Sort {
                expr: order_by,
                input: plan,
                fetch: None,
            }))
        } else {
            Arc::new(LogicalPlan::Extension(Extension {
                node: Arc::new(SortWithinPartitionsNode::new(plan, order_by)),
            }))
        };
        Ok((plan, child_indexes))
    }
}
