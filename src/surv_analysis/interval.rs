use crate::surv_analysis::observation::{EventTime, Observation, PyObservation};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde::{Serialize, Serializer};

/// One step of a Kaplan-Meier curve.
///
/// Covers `(start, end]`; observations that fall at `end` belong here, so
/// deaths and censorings sharing a time instant stay together. The first
/// interval of a curve starts at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval<T = f64, M = ()> {
    pub start: T,
    pub end: T,
    pub deaths: usize,
    /// Survival probability on entering this interval.
    pub cumulative_survival: f64,
    observations: Vec<Observation<T, M>>,
}

impl<T: EventTime, M> Interval<T, M> {
    pub fn new(start: T, end: T) -> Self {
        Self {
            start,
            end,
            deaths: 0,
            cumulative_survival: 0.0,
            observations: Vec::new(),
        }
    }

    /// Builds an interval and files every observation into it.
    pub fn with_observations(
        start: T,
        end: T,
        observations: impl IntoIterator<Item = Observation<T, M>>,
    ) -> Self {
        let mut interval = Self::new(start, end);
        observations.into_iter().for_each(|obs| interval.push(obs));
        interval
    }

    pub fn push(&mut self, observation: Observation<T, M>) {
        if observation.is_event() {
            self.deaths += 1;
        }
        self.observations.push(observation);
    }

    pub fn censored_count(&self) -> usize {
        self.observations.iter().filter(|obs| obs.censored).count()
    }

    pub fn observations(&self) -> &[Observation<T, M>] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation<T, M>> {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IntervalRecord<'a, T, M> {
    start: &'a T,
    end: &'a T,
    died: usize,
    censored: usize,
    cumulative_survival: f64,
    donors: &'a [Observation<T, M>],
}

impl<T, M> Serialize for Interval<T, M>
where
    T: EventTime + Serialize,
    M: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IntervalRecord {
            start: &self.start,
            end: &self.end,
            died: self.deaths,
            censored: self.censored_count(),
            cumulative_survival: self.cumulative_survival,
            donors: &self.observations,
        }
        .serialize(serializer)
    }
}

/// Python-facing interval. Members are the caller's own `Observation` objects.
#[pyclass(name = "Interval")]
#[derive(Debug)]
pub struct PyInterval {
    #[pyo3(get)]
    pub start: f64,
    #[pyo3(get)]
    pub end: f64,
    #[pyo3(get)]
    pub died: usize,
    #[pyo3(get, set)]
    pub cumulative: f64,
    pub data: Vec<Py<PyObservation>>,
}

impl PyInterval {
    pub(crate) fn from_core(interval: Interval<f64, Py<PyObservation>>) -> Self {
        let (start, end, died, cumulative) = (
            interval.start,
            interval.end,
            interval.deaths,
            interval.cumulative_survival,
        );
        Self {
            start,
            end,
            died,
            cumulative,
            data: interval
                .into_observations()
                .into_iter()
                .filter_map(|obs| obs.metadata)
                .collect(),
        }
    }

    /// Rebuilds a core interval from the member times and flags, dropping
    /// Python metadata.
    pub(crate) fn to_core(&self) -> Interval<f64> {
        let mut interval = Interval::with_observations(
            self.start,
            self.end,
            self.data.iter().map(|obs| {
                let obs = obs.get();
                Observation::new(obs.time, obs.censored)
            }),
        );
        interval.cumulative_survival = self.cumulative;
        interval
    }
}

#[pymethods]
impl PyInterval {
    #[new]
    fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            died: 0,
            cumulative: 0.0,
            data: Vec::new(),
        }
    }

    fn add_observation(&mut self, observation: Py<PyObservation>) {
        if !observation.get().censored {
            self.died += 1;
        }
        self.data.push(observation);
    }

    #[getter]
    fn censored(&self) -> usize {
        self.data.iter().filter(|obs| obs.get().censored).count()
    }

    #[getter]
    fn data<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        PyList::new(py, self.data.iter().map(|obs| obs.clone_ref(py)))
    }

    fn to_json_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let donors = PyList::empty(py);
        for obs in &self.data {
            donors.append(obs.get().to_json_dict(py)?)?;
        }
        let dict = PyDict::new(py);
        dict.set_item("start", self.start)?;
        dict.set_item("end", self.end)?;
        dict.set_item("died", self.died)?;
        dict.set_item("censored", self.censored())?;
        dict.set_item("cumulativeSurvival", self.cumulative)?;
        dict.set_item("donors", donors)?;
        Ok(dict)
    }

    fn __len__(&self) -> usize {
        self.data.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Interval(start={}, end={}, died={}, censored={}, cumulative={})",
            self.start,
            self.end,
            self.died,
            self.censored(),
            self.cumulative
        )
    }
}
