use crate::calculation::{FactKind, PatientCalculation};
use crate::common::alive;
use crate::context::CalculationContext;
use crate::result::FactResult;
use epts_diagnostics::Result;
use epts_model::{ObservationStore, ParameterValues, PatientSet};
use std::sync::Arc;

/// Whether each patient is alive on the reference date
pub struct AliveCalculation {
    store: Arc<dyn ObservationStore>,
}

impl AliveCalculation {
    pub const NAME: &'static str = "alive";

    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }
}

impl PatientCalculation for AliveCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Boolean
    }

    fn evaluate(&self, cohort: &PatientSet, _params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        alive(self.store.as_ref(), cohort, ctx.now())
    }
}
