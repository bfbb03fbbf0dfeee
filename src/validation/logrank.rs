use crate::constants::DEFAULT_SIGNIFICANCE_LEVEL;
use crate::error::{Result, SurvivalError};
use crate::surv_analysis::interval::{Interval, PyInterval};
use crate::surv_analysis::kaplan_meier::estimate_cohorts;
use crate::surv_analysis::observation::{EventTime, Observation};
use crate::utilities::statistical::chi2_cdf;
use crate::utilities::validation::{
    validate_cohort_count, validate_non_negative, validate_ordered, ValidationError,
};
use itertools::Itertools;
use log::debug;
use ndarray::{Array1, Array2};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[pyclass(frozen)]
pub struct LogRankResult {
    #[pyo3(get)]
    #[serde(rename = "chiSquared")]
    pub chi_squared: f64,
    #[pyo3(get)]
    #[serde(rename = "degreesFreedom")]
    pub degrees_of_freedom: usize,
    #[pyo3(get)]
    #[serde(rename = "pValue")]
    pub p_value: f64,
    /// Observed deaths per cohort.
    #[pyo3(get)]
    pub observed: Vec<f64>,
    /// Deaths expected per cohort if all cohorts shared one survival function.
    #[pyo3(get)]
    pub expected: Vec<f64>,
}

impl LogRankResult {
    pub fn significant_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

#[pymethods]
impl LogRankResult {
    #[pyo3(signature = (alpha=None))]
    fn is_significant(&self, alpha: Option<f64>) -> bool {
        self.significant_at(alpha.unwrap_or(DEFAULT_SIGNIFICANCE_LEVEL))
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("chiSquared", self.chi_squared)?;
        dict.set_item("degreesFreedom", self.degrees_of_freedom)?;
        dict.set_item("pValue", self.p_value)?;
        dict.set_item("observed", self.observed.clone())?;
        dict.set_item("expected", self.expected.clone())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "LogRankResult(chi_squared={:.4}, degrees_of_freedom={}, p_value={:.6})",
            self.chi_squared, self.degrees_of_freedom, self.p_value
        )
    }
}

/// One distinct time of the log-rank walk. `at_risk` and `expected` use the
/// risk set as it stood before this time's deaths and censorings.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSetRow<T> {
    pub time: T,
    pub at_risk: Array1<f64>,
    pub died: Array1<f64>,
    pub censored: Array1<f64>,
    pub expected: Array1<f64>,
}

/// Log-rank (Mantel-Cox) test across two or more Kaplan-Meier curves.
///
/// Construction flattens every cohort's observations into a sample map: the
/// distinct times in ascending order, with per-cohort death and censoring
/// counts stored as `times x cohorts` matrices.
#[derive(Debug, Clone)]
pub struct LogRankTest<T = f64> {
    times: Vec<T>,
    died: Array2<f64>,
    censored: Array2<f64>,
    population: Vec<usize>,
    observed: Vec<usize>,
    largest_time: Option<T>,
}

impl<T: EventTime> LogRankTest<T> {
    pub fn new<M>(cohorts: &[Vec<Interval<T, M>>]) -> Result<Self> {
        validate_cohort_count(cohorts.len())?;
        if let Some(index) = cohorts.iter().position(|cohort| cohort.is_empty()) {
            return Err(ValidationError::EmptyCohort { index }.into());
        }
        // Hand-built intervals bypass the estimator's checks.
        validate_ordered(member_times(cohorts), "time")?;
        validate_non_negative(member_times(cohorts), "time")?;

        let population: Vec<usize> = cohorts
            .iter()
            .map(|cohort| cohort.iter().map(Interval::len).sum())
            .collect();
        let observed: Vec<usize> = cohorts
            .iter()
            .map(|cohort| cohort.iter().map(|interval| interval.deaths).sum())
            .collect();

        let mut samples: Vec<(T, usize, bool)> = cohorts
            .iter()
            .enumerate()
            .flat_map(|(cohort, intervals)| {
                intervals
                    .iter()
                    .flat_map(|interval| interval.observations())
                    .map(move |obs| (obs.time, cohort, obs.censored))
            })
            .collect();
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let n_times = samples.iter().dedup_by(|a, b| a.0 == b.0).count();
        let mut times = Vec::with_capacity(n_times);
        let mut died = Array2::<f64>::zeros((n_times, cohorts.len()));
        let mut censored = Array2::<f64>::zeros((n_times, cohorts.len()));
        let mut largest_time: Option<T> = None;

        let chunks = samples.iter().chunk_by(|sample| sample.0);
        for (row, (time, group)) in (&chunks).into_iter().enumerate() {
            times.push(time);
            for &(_, cohort, is_censored) in group {
                if is_censored {
                    censored[[row, cohort]] += 1.0;
                } else {
                    died[[row, cohort]] += 1.0;
                    if largest_time.map_or(true, |largest| time > largest) {
                        largest_time = Some(time);
                    }
                }
            }
        }

        debug!(
            "log-rank sample map: {} cohorts, {} distinct times, last death at {:?}",
            cohorts.len(),
            times.len(),
            largest_time
        );

        Ok(Self {
            times,
            died,
            censored,
            population,
            observed,
            largest_time,
        })
    }

    pub fn cohort_count(&self) -> usize {
        self.population.len()
    }

    /// Distinct observation times across all cohorts, ascending.
    pub fn times(&self) -> &[T] {
        &self.times
    }

    pub fn population(&self) -> &[usize] {
        &self.population
    }

    pub fn observed_deaths(&self) -> &[usize] {
        &self.observed
    }

    pub fn largest_time(&self) -> Option<T> {
        self.largest_time
    }

    /// Walks the sample map up to and including the last death time.
    pub fn risk_table(&self) -> Result<Vec<RiskSetRow<T>>> {
        let Some(largest) = self.largest_time else {
            return Ok(Vec::new());
        };
        let mut at_risk: Array1<f64> = self.population.iter().map(|&n| n as f64).collect();
        let mut rows = Vec::new();
        for (sample, &time) in self.times.iter().enumerate() {
            if time > largest {
                break;
            }
            let died = self.died.row(sample);
            let censored = self.censored.row(sample);
            let total_died = died.sum();
            let total_at_risk = at_risk.sum();
            if total_at_risk <= 0.0 {
                return Err(SurvivalError::EmptyRiskSet { sample });
            }
            let expected = at_risk.mapv(|n| total_died * n / total_at_risk);
            rows.push(RiskSetRow {
                time,
                at_risk: at_risk.clone(),
                died: died.to_owned(),
                censored: censored.to_owned(),
                expected,
            });
            at_risk -= &died;
            at_risk -= &censored;
        }
        Ok(rows)
    }

    pub fn compute(&self) -> Result<LogRankResult> {
        let rows = self.risk_table()?;
        let mut expected = Array1::<f64>::zeros(self.cohort_count());
        for row in &rows {
            expected += &row.expected;
        }
        if let Some(cohort) = expected.iter().position(|&e| e <= 0.0) {
            return Err(SurvivalError::ZeroExpectedDeaths { cohort });
        }

        let observed: Array1<f64> = self.observed.iter().map(|&d| d as f64).collect();
        let chi_squared = ((&observed - &expected).mapv(|diff| diff * diff) / &expected).sum();
        let degrees_of_freedom = self.cohort_count() - 1;
        let p_value = 1.0 - chi2_cdf(chi_squared, degrees_of_freedom)?;

        debug!(
            "log-rank over {} times: chi2 = {:.4}, df = {}, p = {:.6}",
            rows.len(),
            chi_squared,
            degrees_of_freedom,
            p_value
        );

        Ok(LogRankResult {
            chi_squared,
            degrees_of_freedom,
            p_value,
            observed: observed.to_vec(),
            expected: expected.to_vec(),
        })
    }
}

fn member_times<T: EventTime, M>(cohorts: &[Vec<Interval<T, M>>]) -> impl Iterator<Item = T> + '_ {
    cohorts
        .iter()
        .flatten()
        .flat_map(|interval| interval.observations())
        .map(|obs| obs.time)
}

/// Estimates every cohort in parallel, then tests them against each other.
pub fn compare_cohorts<T, M>(cohorts: Vec<Vec<Observation<T, M>>>) -> Result<LogRankResult>
where
    T: EventTime + Send,
    M: Send,
{
    validate_cohort_count(cohorts.len())?;
    let intervals = estimate_cohorts(cohorts)?;
    LogRankTest::new(&intervals)?.compute()
}

#[pyfunction]
pub fn log_rank_test(py: Python<'_>, cohorts: Vec<Vec<Py<PyInterval>>>) -> PyResult<LogRankResult> {
    let cohorts: Vec<Vec<Interval<f64>>> = cohorts
        .iter()
        .map(|cohort| {
            cohort
                .iter()
                .map(|interval| interval.borrow(py).to_core())
                .collect()
        })
        .collect();
    Ok(LogRankTest::new(&cohorts)?.compute()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::surv_analysis::kaplan_meier::{compute_intervals, kaplan_meier_arrays};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn obs(time: f64, censored: bool) -> Observation {
        Observation::new(time, censored)
    }

    fn small_cohorts() -> Vec<Vec<Interval>> {
        vec![
            compute_intervals(vec![obs(1.0, false), obs(2.0, true), obs(2.0, false)]).unwrap(),
            compute_intervals(vec![obs(2.0, false), obs(3.0, true)]).unwrap(),
        ]
    }

    #[test]
    fn test_sample_map_groups_by_distinct_time() {
        let test = LogRankTest::new(&small_cohorts()).unwrap();
        assert_eq!(test.times(), &[1.0, 2.0, 3.0]);
        assert_eq!(test.population(), &[3, 2]);
        assert_eq!(test.observed_deaths(), &[2, 1]);
        assert_eq!(test.largest_time(), Some(2.0));
        assert_eq!(test.died, array![[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert_eq!(test.censored, array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_risk_table_stops_at_last_death() {
        let test = LogRankTest::new(&small_cohorts()).unwrap();
        let rows = test.risk_table().unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].at_risk, array![3.0, 2.0]);
        assert_abs_diff_eq!(rows[0].expected[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(rows[0].expected[1], 0.4, epsilon = 1e-12);

        assert_eq!(rows[1].at_risk, array![2.0, 2.0]);
        assert_eq!(rows[1].expected, array![1.0, 1.0]);
    }

    #[test]
    fn test_compute_small_example() {
        let result = LogRankTest::new(&small_cohorts()).unwrap().compute().unwrap();
        assert_eq!(result.degrees_of_freedom, 1);
        assert_abs_diff_eq!(result.expected[0], 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(result.expected[1], 1.4, epsilon = 1e-12);
        assert_eq!(result.observed, vec![2.0, 1.0]);
        assert_abs_diff_eq!(result.chi_squared, 0.1 + 0.16 / 1.4, epsilon = 1e-12);
        assert!(result.p_value > 0.5 && result.p_value < 1.0);
        assert!(!result.significant_at(DEFAULT_SIGNIFICANCE_LEVEL));
    }

    #[test]
    fn test_requires_two_cohorts() {
        let cohorts = vec![compute_intervals(vec![obs(1.0, false)]).unwrap()];
        let err = LogRankTest::new(&cohorts).unwrap_err();
        assert!(matches!(
            err,
            SurvivalError::InvalidInput(ValidationError::InsufficientCohorts { got: 1 })
        ));
    }

    #[test]
    fn test_rejects_empty_cohort() {
        let cohorts: Vec<Vec<Interval>> =
            vec![compute_intervals(vec![obs(1.0, false)]).unwrap(), Vec::new()];
        let err = LogRankTest::new(&cohorts).unwrap_err();
        assert!(matches!(
            err,
            SurvivalError::InvalidInput(ValidationError::EmptyCohort { index: 1 })
        ));
    }

    #[test]
    fn test_rejects_nan_member_time() {
        let cohorts: Vec<Vec<Interval>> = vec![
            vec![Interval::with_observations(0.0, 5.0, [obs(5.0, false), obs(f64::NAN, false)])],
            vec![Interval::with_observations(0.0, 2.0, [obs(2.0, false)])],
        ];
        let err = LogRankTest::new(&cohorts).unwrap_err();
        assert!(matches!(
            err,
            SurvivalError::InvalidInput(ValidationError::NaNValue { field: "time", index: 1 })
        ));
    }

    #[test]
    fn test_rejects_negative_member_time() {
        let cohorts: Vec<Vec<Interval>> = vec![
            vec![Interval::with_observations(0.0, 5.0, [obs(5.0, false)])],
            vec![
                Interval::with_observations(0.0, 2.0, [obs(2.0, false)]),
                Interval::with_observations(2.0, 4.0, [obs(-3.0, false)]),
            ],
        ];
        let err = LogRankTest::new(&cohorts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(matches!(
            err,
            SurvivalError::InvalidInput(ValidationError::NegativeValue { field: "time", index: 2 })
        ));
    }

    #[test]
    fn test_zero_expected_deaths_is_degenerate() {
        // The second cohort leaves the risk set before anyone dies.
        let cohorts: Vec<Vec<Interval>> = vec![
            vec![Interval::with_observations(0.0, 5.0, [obs(5.0, false)])],
            vec![Interval::with_observations(0.0, 1.0, [obs(1.0, true)])],
        ];
        let err = LogRankTest::new(&cohorts).unwrap().compute().unwrap_err();
        assert!(matches!(err, SurvivalError::ZeroExpectedDeaths { cohort: 1 }));
        assert_eq!(err.kind(), ErrorKind::DegenerateComputation);
    }

    #[test]
    fn test_compare_cohorts_matches_manual_pipeline() {
        let raw = vec![
            vec![obs(1.0, false), obs(2.0, true), obs(2.0, false)],
            vec![obs(2.0, false), obs(3.0, true)],
        ];
        let direct = compare_cohorts(raw).unwrap();
        let manual = LogRankTest::new(&small_cohorts()).unwrap().compute().unwrap();
        assert_eq!(direct, manual);
    }

    #[test]
    fn test_result_json_keys() {
        let result = LogRankTest::new(&small_cohorts()).unwrap().compute().unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["degreesFreedom"], 1);
        assert!(value["chiSquared"].is_f64());
        assert!(value["pValue"].is_f64());
        assert_eq!(value["observed"], serde_json::json!([2.0, 1.0]));
    }

    fn py_cohort(py: Python<'_>, times: &[f64], censored: &[bool]) -> Vec<Py<PyInterval>> {
        let time = pyo3::types::PyList::new(py, times).unwrap();
        let censored = pyo3::types::PyList::new(py, censored).unwrap();
        kaplan_meier_arrays(py, time.as_any(), censored.as_any())
            .unwrap()
            .into_iter()
            .map(|interval| Py::new(py, interval).unwrap())
            .collect()
    }

    #[test]
    fn test_log_rank_test_on_python_intervals() {
        Python::attach(|py| {
            let treated = py_cohort(
                py,
                &[
                    6.0, 6.0, 6.0, 6.0, 7.0, 9.0, 10.0, 10.0, 11.0, 13.0, 16.0, 17.0, 19.0, 20.0,
                    22.0, 23.0, 25.0, 32.0, 32.0, 34.0, 35.0,
                ],
                &[
                    false, false, false, true, false, true, false, true, true, false, false, true,
                    true, true, false, false, true, true, true, true, true,
                ],
            );
            let placebo = py_cohort(
                py,
                &[
                    1.0, 1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 5.0, 5.0, 8.0, 8.0, 8.0, 8.0, 11.0, 11.0,
                    12.0, 12.0, 15.0, 17.0, 22.0, 23.0,
                ],
                &[false; 21],
            );

            let result = log_rank_test(py, vec![treated, placebo]).unwrap();
            assert_eq!(result.degrees_of_freedom, 1);
            assert_abs_diff_eq!(result.chi_squared, 15.232850289, epsilon = 1e-6);
            assert_abs_diff_eq!(result.p_value, 9.5036e-5, epsilon = 1e-8);
            assert_eq!(result.observed, vec![9.0, 21.0]);
            assert!(result.is_significant(None));

            let lonely = py_cohort(py, &[1.0, 2.0], &[false, true]);
            let err = log_rank_test(py, vec![lonely]).unwrap_err();
            assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
        });
    }
}
