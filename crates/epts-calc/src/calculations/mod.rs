//! Calculator implementations

mod alive;
mod art_start;
mod completed_ipt;
mod on_art;
mod pregnant_date;
mod routine;
mod viral_load;

pub use alive::AliveCalculation;
pub use art_start::InitialArtStartDateCalculation;
pub use completed_ipt::{
    CompletedIptCalculation, BEGIN_PERIOD_END_DATE, BEGIN_PERIOD_START_DATE, COMPLETION_PERIOD_END_DATE,
    COMPLETION_PERIOD_START_DATE,
};
pub use on_art::{OnArtForMonthsCalculation, MONTHS};
pub use pregnant_date::PregnantDateCalculation;
pub use routine::RoutineViralLoadCalculation;
pub use viral_load::ViralLoadResultsCalculation;
