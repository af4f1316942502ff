use std::fmt::Formatter;
use std::sync::Arc;

use datafusion_common::{internal_err, plan_err, DFSchemaRef, Result};
use datafusion_expr::expr::{Expr, Sort};
use datafusion_expr::{LogicalPlan, UserDefinedLogicalNodeCore};

/// A logical plan node that sorts rows within each partition of its input.
/// The partitioning of the input is retained, so there is no global order.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd)]
pub struct SortWithinPartitionsNode {
    input: Arc<LogicalPlan>,
    sort_expr: Vec<Sort>,
}

impl SortWithinPartitionsNode {
    pub fn new(input: Arc<LogicalPlan>, sort_expr: Vec<Sort>) -> Self {
        Self { input, sort_expr }
    }

    pub fn input(&self) -> &Arc<LogicalPlan> {
        &self.input
    }

    pub fn sort_expr(&self) -> &[Sort] {
        &self.sort_expr
    }
}

impl UserDefinedLogicalNodeCore for SortWithinPartitionsNode {
    fn name(&self) -> &str {
        "SortWithinPartitions"
    }

    fn inputs(&self) -> Vec<&LogicalPlan> {
        vec![self.input.as_ref()]
    }

    fn schema(&self) -> &DFSchemaRef {
        self.input.schema()
    }

    fn expressions(&self) -> Vec<Expr> {
        self.sort_expr.iter().map(|s| s.expr.clone()).collect()
    }

    fn fmt_for_explain(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "SortWithinPartitions: ")?;
        for (i, e) in self.sort_expr.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }

    fn with_exprs_and_inputs(
        &self,
        exprs: Vec<Expr>,
        mut inputs: Vec<LogicalPlan>,
    ) -> Result<Self> {
        if exprs.len() != self.sort_expr.len() {
            return internal_err!(
                "{}: expected {} expressions, got {}",
                self.name(),
                self.sort_expr.len(),
                exprs.len()
            );
        }
        let (Some(input), true) = (inputs.pop(), inputs.is_empty()) else {
            return plan_err!("{} expects exactly one input", self.name());
        };
        // The sort options are kept and only the sort keys are replaced.
        let sort_expr = self
            .sort_expr
            .iter()
            .zip(exprs)
            .map(|(sort, expr)| Sort {
                expr,
                asc: sort.asc,
                nulls_first: sort.nulls_first,
            })
            .collect();
        Ok(Self::new(Arc::new(input), sort_expr))
    }

    fn necessary_children_exprs(&self, output_columns: &[usize]) -> Option<Vec<Vec<usize>>> {
        Some(vec![output_columns.to_vec()])
    }
}

#[cfg(test)]
mod tests {
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use datafusion_expr::logical_plan::builder::table_scan;
    use datafusion_expr::{col, Extension};

    use super::*;

    fn input() -> Result<LogicalPlan> {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Utf8, true),
        ]);
        table_scan(Some("t"), &schema, None)?.build()
    }

    #[test]
    fn test_sort_within_partitions_explain() -> Result<()> {
        let node = SortWithinPartitionsNode::new(
            Arc::new(input()?),
            vec![col("t.a").sort(true, true), col("t.b").sort(false, false)],
        );
        let plan = LogicalPlan::Extension(Extension {
            node: Arc::new(node),
        });
        assert_eq!(
            plan.display_indent().to_string(),
            "SortWithinPartitions: t.a ASC NULLS FIRST, t.b DESC NULLS LAST\n  TableScan: t"
        );
        Ok(())
    }

    #[test]
    fn test_with_exprs_and_inputs_keeps_sort_options() -> Result<()> {
        let sort_expr = vec![col("t.a").sort(false, true)];
        let node = SortWithinPartitionsNode::new(Arc::new(input()?), sort_expr);
        let other = node.with_exprs_and_inputs(vec![col("t.b")], vec![input()?])?;
        assert_eq!(other.sort_expr(), &[col("t.b").sort(false, true)]);
        let exprs = vec![col("t.a"), col("t.b")];
        assert!(node.with_exprs_and_inputs(exprs, vec![input()?]).is_err());
        Ok(())
    }
}
