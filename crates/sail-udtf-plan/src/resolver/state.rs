use std::collections::HashMap;

use datafusion::arrow::datatypes::Schema;
use datafusion_common::DFSchema;

use crate::error::{PlanError, PlanResult};

pub type FieldName = String;
pub type ResolvedFieldName = String;

/// The state shared by all planning steps of one query.
/// Every column is identified by an opaque field name registered here,
/// so two columns with the same display name are never confused.
#[derive(Debug)]
pub struct PlanResolverState {
    next_id: usize,
    fields: HashMap<ResolvedFieldName, FieldName>,
}

impl Default for PlanResolverState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanResolverState {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            fields: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Registers a field and returns a generated opaque name for the field.
    /// The generated name is unique within the plan resolver state.
    /// No assumption should be made about the format of the name.
    pub fn register_field(&mut self, name: impl Into<FieldName>) -> ResolvedFieldName {
        let resolved = format!("#{}", self.next_id());
        self.fields.insert(resolved.clone(), name.into());
        resolved
    }

    /// Registers all fields of a schema and returns the opaque names in field order.
    pub fn register_fields(&mut self, schema: &Schema) -> Vec<ResolvedFieldName> {
        schema
            .fields()
            .iter()
            .map(|field| self.register_field(field.name()))
            .collect()
    }

    pub fn get_field_name(&self, resolved: &str) -> PlanResult<&FieldName> {
        self.fields
            .get(resolved)
            .ok_or_else(|| PlanError::internal(format!("unknown resolved field: {resolved}")))
    }

    pub fn get_field_names(&self, schema: &DFSchema) -> PlanResult<Vec<FieldName>> {
        schema
            .fields()
            .iter()
            .map(|field| Ok(self.get_field_name(field.name())?.to_string()))
            .collect::<PlanResult<Vec<_>>>()
    }
}
