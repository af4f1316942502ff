use datafusion_common::tree_node::TreeNode;
use datafusion_expr::Expr;

use crate::argument::{CallArgument, PlannedArguments};
use crate::error::{PlanError, PlanResult};
use crate::function::table_input::TableInput;
use crate::resolver::state::PlanResolverState;
use crate::resolver::PlanResolver;

impl PlanResolver {
    /// Tells table arguments from scalar arguments in a table-valued function call.
    /// The order of the arguments is retained.
    pub fn classify_arguments(&self, arguments: Vec<Expr>) -> PlanResult<Vec<CallArgument>> {
        arguments
            .into_iter()
            .enumerate()
            .map(|(position, argument)| Self::classify_argument(argument, position))
            .collect()
    }

    fn classify_argument(argument: Expr, position: usize) -> PlanResult<CallArgument> {
        if let Some(input) = TableInput::from_expr(&argument) {
            return Ok(CallArgument::Table(input.argument().clone()));
        }
        if argument.exists(|e| Ok(TableInput::from_expr(e).is_some()))? {
            return Err(PlanError::invalid(format!(
                "table argument must be passed to the table-valued function directly: {argument} at position {position}"
            )));
        }
        Ok(CallArgument::Scalar(argument))
    }

    pub fn plan_call_arguments(
        &self,
        arguments: Vec<Expr>,
        state: &mut PlanResolverState,
    ) -> PlanResult<PlannedArguments> {
        let arguments = self.classify_arguments(arguments)?;
        self.plan_arguments(arguments, state)
    }
}
