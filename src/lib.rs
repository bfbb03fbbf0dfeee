//! Kaplan-Meier survival intervals and the log-rank test for right-censored
//! time-to-event data, usable from Rust and, through pyo3, from Python.
//!
//! ```
//! use survival_km::{compute_intervals, LogRankTest, Observation};
//!
//! let treated = compute_intervals(vec![
//!     Observation::<f64>::event(6.0),
//!     Observation::censored_at(9.0),
//!     Observation::event(13.0),
//! ])
//! .unwrap();
//! let control = compute_intervals(vec![
//!     Observation::<f64>::event(1.0),
//!     Observation::event(4.0),
//!     Observation::censored_at(5.0),
//! ])
//! .unwrap();
//! assert_eq!(treated[0].cumulative_survival, 1.0);
//!
//! let result = LogRankTest::new(&[treated, control]).unwrap().compute().unwrap();
//! assert_eq!(result.degrees_of_freedom, 1);
//! ```

use pyo3::prelude::*;

pub mod constants;
pub mod error;
pub mod surv_analysis;
pub mod utilities;
pub mod validation;


pub use error::{ErrorKind, Result, SurvivalError};
pub use surv_analysis::interval::{Interval, PyInterval};
pub use surv_analysis::kaplan_meier::{
    compute_intervals, estimate_cohorts, kaplan_meier, kaplan_meier_arrays, sort_by_time,
    IntervalCursor, SurvivalEstimator,
};
pub use surv_analysis::observation::{EventTime, Observation, PyObservation};
pub use utilities::validation::ValidationError;
pub use validation::logrank::{
    compare_cohorts, log_rank_test, LogRankResult, LogRankTest, RiskSetRow,
};

#[pymodule]
fn survival_km(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyObservation>()?;
    m.add_class::<PyInterval>()?;
    m.add_class::<LogRankResult>()?;
    m.add_function(wrap_pyfunction!(kaplan_meier, m)?)?;
    m.add_function(wrap_pyfunction!(kaplan_meier_arrays, m)?)?;
    m.add_function(wrap_pyfunction!(log_rank_test, m)?)?;
    Ok(())
}
