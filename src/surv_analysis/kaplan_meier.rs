use crate::error::{Result, SurvivalError};
use crate::surv_analysis::interval::{Interval, PyInterval};
use crate::surv_analysis::observation::{EventTime, Observation, PyObservation};
use crate::utilities::numpy_utils::{extract_censored, extract_times};
use crate::utilities::validation::{
    validate_length, validate_non_empty, validate_non_negative, validate_ordered,
};
use log::{debug, trace, warn};
use pyo3::prelude::*;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Kaplan-Meier estimator over one cohort.
///
/// The estimator owns its observations. [`compute`](Self::compute) sorts them by
/// time and moves each one into the interval that covers it, so the returned
/// intervals hold the caller's data in ascending time order.
#[derive(Debug, Clone)]
pub struct SurvivalEstimator<T = f64, M = ()> {
    observations: Vec<Observation<T, M>>,
}

impl<T: EventTime, M> SurvivalEstimator<T, M> {
    pub fn new(observations: Vec<Observation<T, M>>) -> Result<Self> {
        validate_non_empty(&observations, "observations")?;
        validate_ordered(observations.iter().map(|obs| obs.time), "time")?;
        validate_non_negative(observations.iter().map(|obs| obs.time), "time")?;
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation<T, M>] {
        &self.observations
    }

    /// Builds the interval sequence.
    ///
    /// Returns an empty list when no observation is an event. The last
    /// interval's `cumulative_survival` is its entry value; survival on exit
    /// from the final interval is not recorded.
    pub fn compute(self) -> Result<Vec<Interval<T, M>>> {
        let mut observations = self.observations;
        sort_by_time(&mut observations);

        let bounds = interval_bounds(&observations);
        if bounds.is_empty() {
            warn!(
                "no events among {} observations, survival curve is empty",
                observations.len()
            );
            return Ok(Vec::new());
        }

        let mut intervals: Vec<Interval<T, M>> = bounds
            .into_iter()
            .map(|(start, end)| Interval::new(start, end))
            .collect();
        intervals[0].cumulative_survival = 1.0;

        let population = observations.len();
        let mut cursor = IntervalCursor::new(population);
        for obs in observations {
            let index = cursor.advance_to(&mut intervals, obs.time)?;
            intervals[index].push(obs);
        }

        debug!(
            "estimated {} intervals from {} observations, final survival {:.6}",
            intervals.len(),
            population,
            cursor.survival()
        );
        Ok(intervals)
    }
}

/// Validates, sorts and estimates in one call.
pub fn compute_intervals<T: EventTime, M>(
    observations: Vec<Observation<T, M>>,
) -> Result<Vec<Interval<T, M>>> {
    SurvivalEstimator::new(observations)?.compute()
}

/// Estimates independent cohorts in parallel. Fails with the first error any
/// cohort produces.
pub fn estimate_cohorts<T, M>(
    cohorts: Vec<Vec<Observation<T, M>>>,
) -> Result<Vec<Vec<Interval<T, M>>>>
where
    T: EventTime + Send,
    M: Send,
{
    cohorts.into_par_iter().map(compute_intervals).collect()
}

/// Stable ascending sort; observations sharing a time keep their input order.
pub fn sort_by_time<T: EventTime, M>(observations: &mut [Observation<T, M>]) {
    observations.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
}

/// Interval bounds for time-sorted observations.
///
/// A bound closes at every event time later than the running start, so
/// censoring-only times fold into the interval of the next event. A trailing
/// interval covers observations after the last event. Without any event
/// there are no bounds.
fn interval_bounds<T: EventTime, M>(sorted: &[Observation<T, M>]) -> Vec<(T, T)> {
    let mut bounds = Vec::new();
    let mut start = T::default();
    let mut any_event = false;
    for obs in sorted.iter().filter(|obs| obs.is_event()) {
        any_event = true;
        if obs.time > start {
            bounds.push((start, obs.time));
            start = obs.time;
        }
    }
    if let Some(last) = sorted.last() {
        if any_event && (bounds.is_empty() || last.time > start) {
            bounds.push((start, last.time));
        }
    }
    bounds
}

/// Walks an interval list in time order, carrying the product-limit estimate
/// from one interval into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalCursor {
    index: usize,
    at_risk: usize,
    survival: f64,
}

impl IntervalCursor {
    pub fn new(population: usize) -> Self {
        Self {
            index: 0,
            at_risk: population,
            survival: 1.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn at_risk(&self) -> usize {
        self.at_risk
    }

    pub fn survival(&self) -> f64 {
        self.survival
    }

    /// Moves forward until the current interval's `end` is at or after `time`,
    /// or the last interval is reached, and returns the current index. Every
    /// interval entered gets the survival carried into it.
    pub fn advance_to<T: EventTime, M>(
        &mut self,
        intervals: &mut [Interval<T, M>],
        time: T,
    ) -> Result<usize> {
        while self.index + 1 < intervals.len() && time > intervals[self.index].end {
            self.cross(&intervals[self.index])?;
            self.index += 1;
            intervals[self.index].cumulative_survival = self.survival;
        }
        Ok(self.index)
    }

    fn cross<T: EventTime, M>(&mut self, interval: &Interval<T, M>) -> Result<()> {
        let exhausted = SurvivalError::AtRiskExhausted {
            interval: self.index,
        };
        let exposed = match self.at_risk.checked_sub(interval.censored_count()) {
            Some(n) if n > 0 => n,
            _ => return Err(exhausted),
        };
        let survivors = exposed.checked_sub(interval.deaths).ok_or(exhausted)?;
        self.survival *= survivors as f64 / exposed as f64;
        self.at_risk = survivors;
        trace!(
            "left interval {} ending {:?}: {} of {} survived, cumulative {:.6}",
            self.index,
            interval.end,
            survivors,
            exposed,
            self.survival
        );
        Ok(())
    }
}

/// Kaplan-Meier intervals for a list of `Observation` objects. The list is
/// copied, so the caller's ordering is left alone.
#[pyfunction]
pub fn kaplan_meier(observations: Vec<Py<PyObservation>>) -> PyResult<Vec<PyInterval>> {
    let observations = observations
        .into_iter()
        .map(|handle| {
            let (time, censored) = {
                let obs = handle.get();
                (obs.time, obs.censored)
            };
            Observation::with_metadata(time, censored, handle)
        })
        .collect();
    let intervals = compute_intervals(observations)?;
    Ok(intervals.into_iter().map(PyInterval::from_core).collect())
}

/// Column-oriented variant of [`kaplan_meier`]: parallel arrays of times and
/// censoring flags.
#[pyfunction]
pub fn kaplan_meier_arrays(
    py: Python<'_>,
    time: &Bound<'_, PyAny>,
    censored: &Bound<'_, PyAny>,
) -> PyResult<Vec<PyInterval>> {
    let time = extract_times(time)?;
    let censored = extract_censored(censored)?;
    validate_length(time.len(), censored.len(), "censored").map_err(SurvivalError::from)?;
    let observations = time
        .into_iter()
        .zip(censored)
        .map(|(time, censored)| {
            Py::new(
                py,
                PyObservation {
                    time,
                    censored,
                    meta: None,
                },
            )
        })
        .collect::<PyResult<Vec<_>>>()?;
    kaplan_meier(observations)
}
