//! The calculator contract

use crate::context::CalculationContext;
use crate::result::FactResult;
use epts_diagnostics::Result;
use epts_model::{ParameterValues, PatientSet};
use std::sync::Arc;

/// Kind of fact a calculation produces for each patient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Boolean,
    Date,
    Observations,
}

/// A per-patient temporal fact calculation.
///
/// Implementations must return exactly one entry for every patient in
/// `cohort`. Missing evidence yields the negative default for that patient;
/// errors are reserved for a malformed context or a failing store.
pub trait PatientCalculation: Send + Sync {
    /// Registry name of the calculation
    fn name(&self) -> &str;

    fn kind(&self) -> FactKind;

    fn evaluate(
        &self,
        cohort: &PatientSet,
        params: &ParameterValues,
        ctx: &CalculationContext,
    ) -> Result<FactResult>;
}

/// Shared handle to a calculation
pub type CalculationRef = Arc<dyn PatientCalculation>;

impl std::fmt::Debug for dyn PatientCalculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientCalculation")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
