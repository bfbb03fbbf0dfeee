use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered time domain the estimator and the log-rank test operate on.
///
/// `Default` is taken as the origin of the time axis, so every built-in
/// numeric type qualifies. Only ordering and equality are used; no arithmetic
/// is performed on times.
pub trait EventTime: Copy + PartialOrd + Default + fmt::Debug {}

impl<T: Copy + PartialOrd + Default + fmt::Debug> EventTime for T {}

/// A single subject: the time it left observation and whether it left by
/// censoring (`true`) or by the event of interest (`false`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation<T = f64, M = ()> {
    pub time: T,
    pub censored: bool,
    #[serde(rename = "meta", default)]
    pub metadata: Option<M>,
}

impl<T, M> Observation<T, M> {
    pub fn new(time: T, censored: bool) -> Self {
        Self {
            time,
            censored,
            metadata: None,
        }
    }

    pub fn with_metadata(time: T, censored: bool, metadata: M) -> Self {
        Self {
            time,
            censored,
            metadata: Some(metadata),
        }
    }

    pub fn event(time: T) -> Self {
        Self::new(time, false)
    }

    pub fn censored_at(time: T) -> Self {
        Self::new(time, true)
    }

    #[inline]
    pub fn is_event(&self) -> bool {
        !self.censored
    }
}

/// Python-facing observation. Intervals returned to Python hold references to
/// these objects, so metadata round-trips untouched.
#[derive(Debug)]
#[pyclass(name = "Observation", frozen)]
pub struct PyObservation {
    #[pyo3(get)]
    pub time: f64,
    #[pyo3(get)]
    pub censored: bool,
    pub meta: Option<Py<PyAny>>,
}

#[pymethods]
impl PyObservation {
    #[new]
    #[pyo3(signature = (time, censored, meta=None))]
    fn new(time: f64, censored: bool, meta: Option<Py<PyAny>>) -> Self {
        Self {
            time,
            censored,
            meta,
        }
    }

    #[getter]
    pub fn meta(&self, py: Python<'_>) -> Option<Py<PyAny>> {
        self.meta.as_ref().map(|m| m.clone_ref(py))
    }

    pub fn to_json_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("time", self.time)?;
        dict.set_item("censored", self.censored)?;
        dict.set_item("meta", self.meta(py))?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "Observation(time={}, censored={})",
            self.time,
            if self.censored { "True" } else { "False" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let died: Observation = Observation::event(4.0);
        assert!(died.is_event());
        assert!(died.metadata.is_none());

        let lost: Observation<u32> = Observation::censored_at(9);
        assert!(!lost.is_event());

        let tagged = Observation::with_metadata(2.5, true, "donor-17");
        assert_eq!(tagged.metadata, Some("donor-17"));
    }

    #[test]
    fn test_json_shape() {
        let obs = Observation::with_metadata(7.0, true, serde_json::json!({"id": 55}));
        let value = serde_json::to_value(&obs).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"time": 7.0, "censored": true, "meta": {"id": 55}})
        );

        let parsed: Vec<Observation<f64, serde_json::Value>> = serde_json::from_str(
            r#"[{"time": 1, "censored": false}, {"time": 3.5, "censored": true, "meta": {"id": 4}}]"#,
        )
        .unwrap();
        assert_eq!(parsed[0].time, 1.0);
        assert!(parsed[0].metadata.is_none());
        assert_eq!(parsed[1].metadata, Some(serde_json::json!({"id": 4})));
    }
}
