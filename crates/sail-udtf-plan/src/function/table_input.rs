use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use datafusion::arrow::datatypes::DataType;
use datafusion_common::{exec_err, Result};
use datafusion_expr::expr::ScalarFunction;
use datafusion_expr::{
    ColumnarValue, Expr, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};

use crate::argument::TableArgument;

/// A placeholder function for a table argument bound in a table-valued function call.
/// The function is never evaluated. The table argument is extracted from the call
/// and planned separately.
#[derive(Debug, Clone)]
pub struct TableInput {
    argument: TableArgument,
    signature: Signature,
}

impl TableInput {
    pub fn new(argument: TableArgument) -> Self {
        Self {
            argument,
            signature: Signature::nullary(Volatility::Volatile),
        }
    }

    pub fn argument(&self) -> &TableArgument {
        &self.argument
    }

    /// Returns the table input if the expression is a call to [`TableInput`].
    pub fn from_expr(expr: &Expr) -> Option<&TableInput> {
        let Expr::ScalarFunction(ScalarFunction { func, .. }) = expr else {
            return None;
        };
        func.inner().as_any().downcast_ref::<TableInput>()
    }
}

/// Creates an expression for a table argument in a table-valued function call.
pub fn table_input(argument: TableArgument) -> Expr {
    ScalarUDF::from(TableInput::new(argument)).call(vec![])
}

impl ScalarUDFImpl for TableInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "table_input"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Struct(
            self.argument.plan.schema().fields().clone(),
        ))
    }

    fn invoke_with_args(&self, _args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        exec_err!("table input must be planned as a table argument and cannot be evaluated")
    }

    fn equals(&self, other: &dyn ScalarUDFImpl) -> bool {
        other
            .as_any()
            .downcast_ref::<TableInput>()
            .is_some_and(|other| self.argument == other.argument)
    }

    fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name().hash(&mut hasher);
        self.argument.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use datafusion::arrow::datatypes::{Field, Schema};
    use datafusion_common::Column;
    use datafusion_expr::lit;
    use datafusion_expr::logical_plan::builder::table_scan;

    use super::*;

    fn argument() -> Result<TableArgument> {
        let schema = Schema::new(vec![
            Field::new("#0", DataType::Int64, false),
            Field::new("#1", DataType::Utf8, true),
        ]);
        let plan = table_scan(Some("t"), &schema, None)?.build()?;
        Ok(TableArgument::new(Arc::new(plan))
            .with_partition_by(vec![Expr::Column(Column::new(Some("t"), "#0"))]))
    }

    #[test]
    fn test_table_input_from_expr() -> Result<()> {
        let argument = argument()?;
        let expr = table_input(argument.clone());
        let input = TableInput::from_expr(&expr);
        assert_eq!(input.map(|x| x.argument()), Some(&argument));
        assert!(TableInput::from_expr(&lit(1)).is_none());
        Ok(())
    }

    #[test]
    fn test_table_input_return_type() -> Result<()> {
        let input = TableInput::new(argument()?);
        let DataType::Struct(fields) = input.return_type(&[])? else {
            return exec_err!("struct type expected");
        };
        let names = fields.iter().map(|f| f.name().as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["#0", "#1"]);
        Ok(())
    }

    #[test]
    fn test_table_input_equality() -> Result<()> {
        let argument = argument()?;
        assert_eq!(table_input(argument.clone()), table_input(argument.clone()));
        let other = argument.clone().with_single_partition();
        assert_ne!(table_input(argument), table_input(other));
        Ok(())
    }
}
