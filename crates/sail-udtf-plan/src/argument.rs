use std::fmt;
use std::sync::Arc;

use datafusion_expr::expr::Sort;
use datafusion_expr::{Expr, LogicalPlan};

use crate::error::{PlanError, PlanResult};

/// An argument of a table-valued function call, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallArgument {
    Scalar(Expr),
    Table(TableArgument),
}

impl CallArgument {
    pub fn is_table(&self) -> bool {
        matches!(self, CallArgument::Table(_))
    }
}

/// A relation passed to a table-valued function, with the directives that
/// control how its rows are grouped and ordered before the function sees them.
///
/// `with_single_partition` and a non-empty `partition_by` are mutually exclusive.
/// The combination is rejected when the argument is planned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableArgument {
    pub plan: Arc<LogicalPlan>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<Sort>,
    pub with_single_partition: bool,
}

impl TableArgument {
    pub fn new(plan: Arc<LogicalPlan>) -> Self {
        Self {
            plan,
            partition_by: vec![],
            order_by: vec![],
            with_single_partition: false,
        }
    }

    pub fn with_partition_by(mut self, partition_by: Vec<Expr>) -> Self {
        self.partition_by = partition_by;
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<Sort>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_single_partition(mut self) -> Self {
        self.with_single_partition = true;
        self
    }

    pub fn has_directives(&self) -> bool {
        self.with_single_partition || !self.partition_by.is_empty() || !self.order_by.is_empty()
    }

    /// The directive clauses specified for this argument, in syntax order.
    fn directive_clauses(&self) -> Vec<&'static str> {
        let mut clauses = vec![];
        if !self.partition_by.is_empty() {
            clauses.push("PARTITION BY");
        }
        if self.with_single_partition {
            clauses.push("WITH SINGLE PARTITION");
        }
        if !self.order_by.is_empty() {
            clauses.push("ORDER BY");
        }
        clauses
    }

    pub fn validate(&self, position: usize) -> PlanResult<()> {
        if self.with_single_partition && !self.partition_by.is_empty() {
            return Err(PlanError::invalid_directives(
                position,
                "WITH SINGLE PARTITION cannot be combined with PARTITION BY",
            ));
        }
        Ok(())
    }

    /// Applies the directives a function declares for its table argument.
    /// The declared directives are only allowed when the call site does not
    /// specify any directive itself.
    pub fn with_requirement(
        self,
        requirement: &TableArgumentRequirement,
        position: usize,
    ) -> PlanResult<Self> {
        if requirement.is_empty() {
            return Ok(self);
        }
        if self.has_directives() {
            let clauses = self.directive_clauses().join(", ");
            return Err(PlanError::invalid_directives(
                position,
                format!(
                    "the function requires partitioning or ordering of its table argument, \
                     which conflicts with {clauses} in the function call"
                ),
            ));
        }
        let TableArgumentRequirement {
            partition_by,
            order_by,
            with_single_partition,
        } = requirement.clone();
        Ok(Self {
            plan: self.plan,
            partition_by,
            order_by,
            with_single_partition,
        })
    }
}

/// The partitioning and ordering a table-valued function declares for its
/// table argument when the function is analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TableArgumentRequirement {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<Sort>,
    pub with_single_partition: bool,
}

impl TableArgumentRequirement {
    pub fn is_empty(&self) -> bool {
        !self.with_single_partition && self.partition_by.is_empty() && self.order_by.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveClause {
    PartitionBy,
    OrderBy,
}

impl DirectiveClause {
    /// The display name of a column appended for an expression of this clause.
    pub(crate) fn column_name(&self, index: usize) -> String {
        match self {
            DirectiveClause::PartitionBy => format!("partition_by_{index}"),
            DirectiveClause::OrderBy => format!("order_by_{index}"),
        }
    }
}

impl fmt::Display for DirectiveClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveClause::PartitionBy => write!(f, "PARTITION BY"),
            DirectiveClause::OrderBy => write!(f, "ORDER BY"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Unspecified,
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullOrdering {
    Unspecified,
    NullsFirst,
    NullsLast,
}

/// Builds an `ORDER BY` item of a table argument.
/// Nulls come first in ascending order and last in descending order
/// unless the null ordering is specified.
pub fn sort_order(expr: Expr, direction: SortDirection, null_ordering: NullOrdering) -> Sort {
    let asc = match direction {
        SortDirection::Ascending | SortDirection::Unspecified => true,
        SortDirection::Descending => false,
    };
    let nulls_first = match null_ordering {
        NullOrdering::NullsFirst => true,
        NullOrdering::NullsLast => false,
        NullOrdering::Unspecified => asc,
    };
    Sort {
        expr,
        asc,
        nulls_first,
    }
}

/// A call argument after planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedArgument {
    Scalar(Expr),
    Table {
        /// The relation, with the projection, repartitioning and sorting
        /// required by the directives applied on top.
        plan: Arc<LogicalPlan>,
        /// The positions of the `PARTITION BY` expressions followed by the
        /// `ORDER BY` expressions in the flattened row of the function input.
        child_indexes: Vec<usize>,
    },
}

impl PlannedArgument {
    /// The number of values this argument contributes to a flattened row.
    pub fn width(&self) -> usize {
        match self {
            PlannedArgument::Scalar(_) => 1,
            PlannedArgument::Table { plan, .. } => plan.schema().fields().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArguments {
    pub arguments: Vec<PlannedArgument>,
    /// The child indexes of all table arguments, in call order.
    pub child_indexes: Vec<usize>,
}

impl PlannedArguments {
    pub fn flattened_columns(&self) -> usize {
        self.arguments.iter().map(|x| x.width()).sum()
    }
}

#[cfg(test)]
mod tests {
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use datafusion_common::Column;
    use datafusion_expr::lit;
    use datafusion_expr::logical_plan::builder::table_scan;

    use super::*;

    fn column() -> Expr {
        Expr::Column(Column::new(Some("t"), "#0"))
    }

    fn plan() -> PlanResult<Arc<LogicalPlan>> {
        let schema = Schema::new(vec![Field::new("#0", DataType::Int64, false)]);
        Ok(Arc::new(table_scan(Some("t"), &schema, None)?.build()?))
    }

    #[test]
    fn test_sort_order_defaults() {
        let order = |direction, null_ordering| sort_order(lit(1), direction, null_ordering);
        assert_eq!(
            order(SortDirection::Unspecified, NullOrdering::Unspecified),
            lit(1).sort(true, true)
        );
        assert_eq!(
            order(SortDirection::Descending, NullOrdering::Unspecified),
            lit(1).sort(false, false)
        );
        assert_eq!(
            order(SortDirection::Descending, NullOrdering::NullsFirst),
            lit(1).sort(false, true)
        );
        assert_eq!(
            order(SortDirection::Ascending, NullOrdering::NullsLast),
            lit(1).sort(true, false)
        );
    }

    #[test]
    fn test_validate_directives() -> PlanResult<()> {
        let argument = TableArgument::new(plan()?)
            .with_partition_by(vec![column()])
            .with_single_partition();
        assert!(matches!(
            argument.validate(2),
            Err(PlanError::InvalidDirectiveCombination { position: 2, .. })
        ));
        TableArgument::new(plan()?)
            .with_single_partition()
            .with_order_by(vec![column().sort(true, true)])
            .validate(0)?;
        Ok(())
    }

    #[test]
    fn test_with_requirement() -> PlanResult<()> {
        let requirement = TableArgumentRequirement {
            partition_by: vec![column()],
            order_by: vec![],
            with_single_partition: false,
        };

        let argument = TableArgument::new(plan()?).with_requirement(&requirement, 0)?;
        assert_eq!(argument.partition_by, vec![column()]);

        let argument = TableArgument::new(plan()?).with_single_partition();
        assert!(matches!(
            argument.with_requirement(&requirement, 1),
            Err(PlanError::InvalidDirectiveCombination { position: 1, .. })
        ));

        let argument = TableArgument::new(plan()?).with_order_by(vec![column().sort(false, true)]);
        let Err(PlanError::InvalidDirectiveCombination { message, .. }) =
            argument.with_requirement(&requirement, 0)
        else {
            return Err(PlanError::internal("invalid directive combination expected"));
        };
        assert!(message.contains("conflicts with ORDER BY in"));
        assert!(!message.contains("PARTITION BY"));

        let argument = TableArgument::new(plan()?)
            .with_single_partition()
            .with_order_by(vec![column().sort(true, true)]);
        let Err(PlanError::InvalidDirectiveCombination { message, .. }) =
            argument.with_requirement(&requirement, 0)
        else {
            return Err(PlanError::internal("invalid directive combination expected"));
        };
        assert!(message.contains("conflicts with WITH SINGLE PARTITION, ORDER BY in"));

        let argument = TableArgument::new(plan()?).with_order_by(vec![lit(1).sort(true, true)]);
        let unchanged = argument
            .clone()
            .with_requirement(&TableArgumentRequirement::default(), 0)?;
        assert_eq!(unchanged, argument);
        Ok(())
    }
}
