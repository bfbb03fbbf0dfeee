use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple};

fn type_name(obj: &Bound<'_, PyAny>) -> String {
    obj.get_type()
        .name()
        .map(|s| s.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn is_sequence(obj: &Bound<'_, PyAny>) -> bool {
    obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>()
}

/// Pulls a column out of a pandas or polars series so it can be read as an array.
fn as_numpy<'py>(obj: &Bound<'py, PyAny>) -> Option<Bound<'py, PyAny>> {
    if let Ok(values) = obj.getattr("values") {
        return Some(values);
    }
    obj.getattr("to_numpy")
        .and_then(|to_numpy| to_numpy.call0())
        .ok()
}

/// Reads event times from a numpy array, a pandas/polars series or a list.
pub fn extract_times(obj: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    // Plain sequences never touch the numpy C API, so they work without numpy installed.
    if is_sequence(obj) {
        return obj.extract::<Vec<f64>>();
    }
    if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, f64>>() {
        return Ok(arr.as_array().to_vec());
    }
    if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, i64>>() {
        return Ok(arr.as_array().iter().map(|&t| t as f64).collect());
    }
    if let Some(column) = as_numpy(obj) {
        if let Ok(arr) = column.extract::<PyReadonlyArray1<'_, f64>>() {
            return Ok(arr.as_array().to_vec());
        }
        if let Ok(arr) = column.extract::<PyReadonlyArray1<'_, i64>>() {
            return Ok(arr.as_array().iter().map(|&t| t as f64).collect());
        }
    }
    Err(PyTypeError::new_err(format!(
        "Cannot convert '{}' to event times. Expected: numpy array, pandas Series, polars Series, or list of numbers.",
        type_name(obj)
    )))
}

/// Reads censoring flags. Boolean input is taken as-is; integer input treats
/// any non-zero value as censored.
pub fn extract_censored(obj: &Bound<'_, PyAny>) -> PyResult<Vec<bool>> {
    if is_sequence(obj) {
        if let Ok(list) = obj.extract::<Vec<bool>>() {
            return Ok(list);
        }
        return Ok(obj
            .extract::<Vec<i64>>()?
            .into_iter()
            .map(|c| c != 0)
            .collect());
    }
    if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, bool>>() {
        return Ok(arr.as_array().to_vec());
    }
    if let Ok(arr) = obj.extract::<PyReadonlyArray1<'_, i64>>() {
        return Ok(arr.as_array().iter().map(|&c| c != 0).collect());
    }
    if let Some(column) = as_numpy(obj) {
        if let Ok(arr) = column.extract::<PyReadonlyArray1<'_, bool>>() {
            return Ok(arr.as_array().to_vec());
        }
        if let Ok(arr) = column.extract::<PyReadonlyArray1<'_, i64>>() {
            return Ok(arr.as_array().iter().map(|&c| c != 0).collect());
        }
    }
    Err(PyTypeError::new_err(format!(
        "Cannot convert '{}' to censoring flags. Expected: boolean or 0/1 integer array, Series, or list.",
        type_name(obj)
    )))
}
