use std::sync::Arc;

use crate::config::PlanConfig;

mod argument;
mod partition;
pub mod state;

/// Plans the arguments of table-valued function calls.
pub struct PlanResolver {
    config: Arc<PlanConfig>,
}

impl PlanResolver {
    pub fn new(config: Arc<PlanConfig>) -> Self {
        Self { config }
    }
}
