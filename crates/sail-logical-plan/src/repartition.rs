use std::fmt::Formatter;
use std::sync::Arc;

use datafusion::logical_expr::LogicalPlan;
use datafusion_common::{plan_err, DFSchemaRef, Result};
use datafusion_expr::{expr_vec_fmt, Expr, UserDefinedLogicalNodeCore};

/// The way rows are moved between partitions by an [`ExplicitRepartitionNode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd)]
pub enum RepartitionMode {
    /// All rows are moved into one partition, regardless of the input partitioning.
    Single,
    /// Rows are hash-partitioned by the partitioning expressions.
    /// When the number of partitions is not set, the session default is used.
    Hash { num_partitions: Option<usize> },
}

/// A logical plan node for repartitioning that is explicitly required by the query,
/// such as a table argument of a table-valued function with
/// `PARTITION BY` or `WITH SINGLE PARTITION`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd)]
pub struct ExplicitRepartitionNode {
    input: Arc<LogicalPlan>,
    mode: RepartitionMode,
    partitioning_expressions: Vec<Expr>,
}

impl ExplicitRepartitionNode {
    pub fn try_new(
        input: Arc<LogicalPlan>,
        mode: RepartitionMode,
        partitioning_expressions: Vec<Expr>,
    ) -> Result<Self> {
        match mode {
            RepartitionMode::Single if !partitioning_expressions.is_empty() => {
                return plan_err!(
                    "single partition repartitioning does not accept partitioning expressions"
                );
            }
            RepartitionMode::Hash { .. } if partitioning_expressions.is_empty() => {
                return plan_err!("hash repartitioning requires at least one expression");
            }
            RepartitionMode::Hash {
                num_partitions: Some(0),
            } => {
                return plan_err!("hash repartitioning requires a positive number of partitions");
            }
            _ => {}
        }
        Ok(Self {
            input,
            mode,
            partitioning_expressions,
        })
    }

    pub fn single(input: Arc<LogicalPlan>) -> Self {
        Self {
            input,
            mode: RepartitionMode::Single,
            partitioning_expressions: vec![],
        }
    }

    pub fn hash(
        input: Arc<LogicalPlan>,
        partitioning_expressions: Vec<Expr>,
        num_partitions: Option<usize>,
    ) -> Result<Self> {
        Self::try_new(
            input,
            RepartitionMode::Hash { num_partitions },
            partitioning_expressions,
        )
    }

    pub fn input(&self) -> &Arc<LogicalPlan> {
        &self.input
    }

    pub fn mode(&self) -> RepartitionMode {
        self.mode
    }

    pub fn num_partitions(&self) -> Option<usize> {
        match self.mode {
            RepartitionMode::Single => Some(1),
            RepartitionMode::Hash { num_partitions } => num_partitions,
        }
    }

    pub fn partitioning_expressions(&self) -> &[Expr] {
        &self.partitioning_expressions
    }
}

impl UserDefinedLogicalNodeCore for ExplicitRepartitionNode {
    fn name(&self) -> &str {
        "ExplicitRepartition"
    }

    fn inputs(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }

    fn schema(&self) -> &DFSchemaRef {
        self.input.schema()
    }

    fn expressions(&self) -> Vec<Expr> {
        self.partitioning_expressions.clone()
    }

    fn fmt_for_explain(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.mode {
            RepartitionMode::Single => write!(f, "ExplicitRepartition: single"),
            RepartitionMode::Hash { num_partitions } => write!(
                f,
                "ExplicitRepartition: hash, n={:?}, expr=[{}]",
                num_partitions,
                expr_vec_fmt!(self.partitioning_expressions)
            ),
        }
    }

    fn with_exprs_and_inputs(
        &self,
        exprs: Vec<Expr>,
        mut inputs: Vec<LogicalPlan>,
    ) -> Result<Self> {
        let (Some(input), true) = (inputs.pop(), inputs.is_empty()) else {
            return plan_err!("{} expects exactly one input", self.name());
        };
        Self::try_new(Arc::new(input), self.mode, exprs)
    }

    fn necessary_children_exprs(&self, output_columns: &[usize]) -> Option<Vec<Vec<usize>>> {
        Some(vec![output_columns.to_vec()])
    }
}
