use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linalg::eigh::Eigh;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use crate::error::{OutlierError, Result};

/// Gram eigenvalues below `largest * max(rows, cols) * RANK_TOLERANCE`
/// count as zero.
const RANK_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// Ordinary least squares with an intercept.
///
/// Returns `(coefficients, intercept)`. A rank-deficient design (a flat
/// series, or windows that are exact linear combinations of each other)
/// gets the minimum-norm solution, so every finite input has a fit.
pub fn fit_least_squares(
    design: &Array2<f64>,
    targets: &Array1<f64>,
) -> Result<(Array1<f64>, f64)> {
    if design.nrows() == 0 || design.nrows() != targets.len() {
        return Err(OutlierError::DimensionMismatch {
            context: "regression targets",
            expected: design.nrows(),
            got: targets.len(),
        });
    }

    let problem = CenteredProblem::new(design, targets)?;
    let rank = problem.rank();
    if rank == design.ncols() {
        let dataset = Dataset::new(design.clone(), targets.clone());
        match LinearRegression::new().fit(&dataset) {
            Ok(model) if is_finite_solution(model.params(), model.intercept()) => {
                return Ok((model.params().to_owned(), model.intercept()));
            }
            Ok(_) => debug!("least-squares solution is not finite, using minimum-norm solution"),
            Err(err) => debug!(error = %err, "solver failed, using minimum-norm solution"),
        }
    } else {
        debug!(rank, n_features = design.ncols(), "rank-deficient design");
    }
    problem.min_norm_solution()
}

fn is_finite_solution(coefficients: &Array1<f64>, intercept: f64) -> bool {
    intercept.is_finite() && coefficients.iter().all(|c| c.is_finite())
}

/// Least-squares problem after removing column and target means, with
/// the eigen-decomposition of its Gram matrix.
struct CenteredProblem {
    x_mean: Array1<f64>,
    y_mean: f64,
    moments: Array1<f64>,
    eigvals: Array1<f64>,
    eigvecs: Array2<f64>,
    cutoff: f64,
}

impl CenteredProblem {
    fn new(design: &Array2<f64>, targets: &Array1<f64>) -> Result<Self> {
        let (n_rows, n_features) = design.dim();
        let x_mean = design
            .mean_axis(Axis(0))
            .ok_or_else(|| OutlierError::Regression("empty design matrix".to_string()))?;
        let y_mean = targets
            .mean()
            .ok_or_else(|| OutlierError::Regression("empty target vector".to_string()))?;
        let centered = design - &x_mean;
        let gram = centered.t().dot(&centered);
        let moments = centered.t().dot(&(targets - y_mean));

        // a flat design has nothing to decompose
        let (eigvals, eigvecs) = if gram.iter().all(|v| *v == 0.0) {
            (Array1::zeros(n_features), Array2::eye(n_features))
        } else {
            gram.eigh()
                .map_err(|e| OutlierError::Regression(e.to_string()))?
        };
        let largest = eigvals.iter().copied().fold(0.0, f64::max);
        let cutoff = largest * n_rows.max(n_features) as f64 * RANK_TOLERANCE;

        Ok(CenteredProblem {
            x_mean,
            y_mean,
            moments,
            eigvals,
            eigvecs,
            cutoff,
        })
    }

    /// Eigen-directions above rounding level.
    fn rank(&self) -> usize {
        self.eigvals.iter().filter(|&&l| l > self.cutoff).count()
    }

    /// Pseudo-inverse solution; directions at rounding level are dropped.
    fn min_norm_solution(&self) -> Result<(Array1<f64>, f64)> {
        let mut coefficients = Array1::<f64>::zeros(self.x_mean.len());
        for (k, &lambda) in self.eigvals.iter().enumerate() {
            if lambda > self.cutoff {
                let direction = self.eigvecs.column(k);
                coefficients.scaled_add(direction.dot(&self.moments) / lambda, &direction);
            }
        }
        let intercept = self.y_mean - self.x_mean.dot(&coefficients);
        if !is_finite_solution(&coefficients, intercept) {
            return Err(OutlierError::Regression(
                "least-squares solution is not finite".to_string(),
            ));
        }
        Ok((coefficients, intercept))
    }
}
