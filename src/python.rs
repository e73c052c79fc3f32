use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::config::MultiAutoRegConfig;
use crate::error::OutlierError;
use crate::models::autoreg::AutoRegOD;
use crate::models::base_model::CollectiveDetector;
use crate::models::multi_autoreg::MultiAutoRegOD;
use crate::utils::combination::CombinationMethod;
use crate::utils::threshold::ProbabilityMethod;

/// Maps detector errors into Python exception classes.
fn to_pyerr(err: OutlierError) -> PyErr {
    match err {
        OutlierError::NotFitted
        | OutlierError::InconsistentWindowing(_)
        | OutlierError::Regression(_)
        | OutlierError::ThreadPool(_) => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

type ScoredWindows<'py, T> = (&'py T, Vec<usize>, Vec<usize>);

/// Python-exposed wrapper around the univariate AutoRegOD
#[pyclass(name = "AutoRegOD")]
pub struct PyAutoRegOD {
    inner: AutoRegOD,
}

#[pymethods]
impl PyAutoRegOD {
    #[new]
    #[pyo3(signature = (window_size, step_size=1, contamination=0.1))]
    fn new(window_size: usize, step_size: usize, contamination: f64) -> PyResult<Self> {
        let inner = AutoRegOD::new(window_size, step_size, contamination).map_err(to_pyerr)?;
        Ok(PyAutoRegOD { inner })
    }

    fn fit(&mut self, x: PyReadonlyArray1<f64>) -> PyResult<()> {
        self.inner.fit_series(x.as_array()).map_err(to_pyerr)
    }

    fn decision_function<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray1<f64>,
    ) -> PyResult<ScoredWindows<'py, PyArray1<f64>>> {
        let scored = self
            .inner
            .decision_function_series(x.as_array())
            .map_err(to_pyerr)?;
        Ok((
            scored.values.into_pyarray(py),
            scored.bounds.left_inds,
            scored.bounds.right_inds,
        ))
    }

    fn predict<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray1<f64>,
    ) -> PyResult<ScoredWindows<'py, PyArray1<u8>>> {
        let x = x.as_array();
        let labels = self
            .inner
            .predict(x.insert_axis(ndarray::Axis(1)))
            .map_err(to_pyerr)?;
        Ok((
            labels.values.into_pyarray(py),
            labels.bounds.left_inds,
            labels.bounds.right_inds,
        ))
    }

    #[getter]
    fn decision_scores_<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<f64>> {
        Ok(self.inner.decision_scores().map_err(to_pyerr)?.to_pyarray(py))
    }

    #[getter]
    fn labels_<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<u8>> {
        Ok(self.inner.labels().map_err(to_pyerr)?.to_pyarray(py))
    }

    #[getter]
    fn threshold_(&self) -> PyResult<f64> {
        Ok(self.inner.threshold().map_err(to_pyerr)?.threshold)
    }

    #[getter]
    fn valid_len_(&self) -> PyResult<usize> {
        self.inner.valid_len().map_err(to_pyerr)
    }

    #[getter]
    fn left_inds_(&self) -> PyResult<Vec<usize>> {
        Ok(self.inner.bounds().map_err(to_pyerr)?.left_inds.clone())
    }

    #[getter]
    fn right_inds_(&self) -> PyResult<Vec<usize>> {
        Ok(self.inner.bounds().map_err(to_pyerr)?.right_inds.clone())
    }
}

/// Python-exposed wrapper around MultiAutoRegOD
#[pyclass(name = "MultiAutoRegOD")]
pub struct PyMultiAutoRegOD {
    inner: MultiAutoRegOD,
}

#[pymethods]
impl PyMultiAutoRegOD {
    #[new]
    #[pyo3(signature = (
        window_size,
        step_size = 1,
        method = "average",
        weights = None,
        contamination = 0.1,
        n_buckets = 5,
        random_state = None,
        n_jobs = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        window_size: usize,
        step_size: usize,
        method: &str,
        weights: Option<Vec<f64>>,
        contamination: f64,
        n_buckets: usize,
        random_state: Option<u64>,
        n_jobs: Option<usize>,
    ) -> PyResult<Self> {
        let method: CombinationMethod = method.parse().map_err(to_pyerr)?;
        let config = MultiAutoRegConfig {
            window_size,
            step_size,
            contamination,
            method,
            weights,
            n_buckets,
            random_state,
            n_jobs,
        };
        let inner = MultiAutoRegOD::with_config(config).map_err(to_pyerr)?;
        Ok(PyMultiAutoRegOD { inner })
    }

    fn fit(&mut self, py: Python<'_>, x: PyReadonlyArray2<f64>) -> PyResult<()> {
        let x = x.as_array().to_owned();
        let inner = &mut self.inner;
        py.allow_threads(|| inner.fit(x.view())).map_err(to_pyerr)
    }

    fn decision_function<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray2<f64>,
    ) -> PyResult<ScoredWindows<'py, PyArray1<f64>>> {
        let x = x.as_array().to_owned();
        let inner = &self.inner;
        let scored = py
            .allow_threads(|| inner.decision_function(x.view()))
            .map_err(to_pyerr)?;
        Ok((
            scored.values.into_pyarray(py),
            scored.bounds.left_inds,
            scored.bounds.right_inds,
        ))
    }

    fn predict<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray2<f64>,
    ) -> PyResult<ScoredWindows<'py, PyArray1<u8>>> {
        let x = x.as_array().to_owned();
        let inner = &self.inner;
        let labels = py
            .allow_threads(|| inner.predict(x.view()))
            .map_err(to_pyerr)?;
        Ok((
            labels.values.into_pyarray(py),
            labels.bounds.left_inds,
            labels.bounds.right_inds,
        ))
    }

    #[pyo3(signature = (x, method = "linear"))]
    fn predict_proba<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray2<f64>,
        method: &str,
    ) -> PyResult<ScoredWindows<'py, PyArray2<f64>>> {
        let method: ProbabilityMethod = method.parse().map_err(to_pyerr)?;
        let x = x.as_array().to_owned();
        let inner = &self.inner;
        let probs = py
            .allow_threads(|| inner.predict_proba(x.view(), method))
            .map_err(to_pyerr)?;
        Ok((
            probs.values.into_pyarray(py),
            probs.bounds.left_inds,
            probs.bounds.right_inds,
        ))
    }

    #[getter]
    fn decision_scores_<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<f64>> {
        Ok(self.inner.decision_scores().map_err(to_pyerr)?.to_pyarray(py))
    }

    #[getter]
    fn labels_<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<u8>> {
        Ok(self.inner.labels().map_err(to_pyerr)?.to_pyarray(py))
    }

    #[getter]
    fn threshold_(&self) -> PyResult<f64> {
        Ok(self.inner.threshold().map_err(to_pyerr)?.threshold)
    }

    #[getter]
    fn valid_len_(&self) -> PyResult<usize> {
        self.inner.valid_len().map_err(to_pyerr)
    }

    #[getter]
    fn left_inds_(&self) -> PyResult<Vec<usize>> {
        Ok(self.inner.left_inds().map_err(to_pyerr)?.to_vec())
    }

    #[getter]
    fn right_inds_(&self) -> PyResult<Vec<usize>> {
        Ok(self.inner.right_inds().map_err(to_pyerr)?.to_vec())
    }
}
