use crate::ModelError;
use crate::neural_network::{Tensor, as_1d, as_2d};
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

/// Stabilizing constant added to row norms before dividing
pub const DEFAULT_NORM_EPSILON: f32 = 1e-8;

/// Euclidean norm of every row
fn row_norms(x: ArrayView2<f32>) -> Array1<f32> {
    x.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

fn normalize_rows(x: ArrayView2<f32>, norms: &Array1<f32>, eps: f32) -> Array2<f32> {
    let mut out = x.to_owned();
    Zip::from(out.rows_mut())
        .and(norms)
        .for_each(|mut row, &norm| {
            let denom = norm + eps;
            row.mapv_inplace(|v| v / denom);
        });
    out
}

/// Scales every row of a 2D tensor to unit Euclidean length.
///
/// Each row is divided by `‖row‖₂ + eps`, so an all-zero row stays all-zero instead of
/// producing NaN.
///
/// # Parameters
///
/// - `x` - Tensor of shape (batch, features)
/// - `eps` - Stabilizing constant added to each norm, usually [`DEFAULT_NORM_EPSILON`]
///
/// # Returns
///
/// - `Ok(Tensor)` - The normalized tensor, same shape as `x`
/// - `Err(ModelError::InputValidationError)` - If `x` is not two-dimensional
///
/// # Examples
/// ```rust
/// use model_factory::neural_network::{normalize_2d, DEFAULT_NORM_EPSILON};
/// use ndarray::array;
///
/// let x = array![[3.0f32, 4.0], [0.0, 0.0]].into_dyn();
/// let y = normalize_2d(&x, DEFAULT_NORM_EPSILON).unwrap();
/// assert!((y[[0, 0]] - 0.6).abs() < 1e-6);
/// assert_eq!(y[[1, 1]], 0.0);
/// ```
pub fn normalize_2d(x: &Tensor, eps: f32) -> Result<Tensor, ModelError> {
    let x = as_2d(x, "x")?;
    let norms = row_norms(x);
    Ok(normalize_rows(x, &norms, eps).into_dyn())
}

fn check_pair_shapes(u: ArrayView2<f32>, v: ArrayView2<f32>) -> Result<(), ModelError> {
    if u.dim() != v.dim() {
        return Err(ModelError::InputValidationError(format!(
            "Cosine similarity inputs must have the same shape, got {:?} and {:?}",
            u.shape(),
            v.shape()
        )));
    }
    Ok(())
}

/// Computes the cosine similarity of corresponding rows of `u` and `v`.
///
/// Both inputs are normalized with [`normalize_2d`] (using [`DEFAULT_NORM_EPSILON`]) and
/// the per-row dot product is returned.
///
/// # Parameters
///
/// - `u` - Tensor of shape (batch, features)
/// - `v` - Tensor of shape (batch, features)
///
/// # Returns
///
/// - `Ok(Tensor)` - 1D tensor of length `batch` holding one similarity per row
/// - `Err(ModelError::InputValidationError)` - If either input is not 2D or the shapes differ
///
/// # Examples
/// ```rust
/// use model_factory::neural_network::cosine_similarity;
/// use ndarray::array;
///
/// let u = array![[1.0f32, 0.0], [1.0, 1.0]].into_dyn();
/// let v = array![[0.0f32, 2.0], [2.0, 2.0]].into_dyn();
/// let s = cosine_similarity(&u, &v).unwrap();
/// assert!(s[0].abs() < 1e-6);
/// assert!((s[1] - 1.0).abs() < 1e-6);
/// ```
pub fn cosine_similarity(u: &Tensor, v: &Tensor) -> Result<Tensor, ModelError> {
    let u = as_2d(u, "u")?;
    let v = as_2d(v, "v")?;
    check_pair_shapes(u, v)?;

    let u2 = normalize_rows(u, &row_norms(u), DEFAULT_NORM_EPSILON);
    let v2 = normalize_rows(v, &row_norms(v), DEFAULT_NORM_EPSILON);

    Ok((u2 * v2).sum_axis(Axis(1)).into_dyn())
}

/// Gradients of [`cosine_similarity`] with respect to both inputs.
///
/// With `a = ‖u‖ + eps`, `b = ‖v‖ + eps` and similarity `s`, the row gradients are
/// `(v/b - s·u/‖u‖) / a` and `(u/a - s·v/‖v‖) / b`, each scaled by the upstream gradient of
/// that row. For a zero row the norm term is dropped.
///
/// # Parameters
///
/// - `u` - First input, shape (batch, features)
/// - `v` - Second input, shape (batch, features)
/// - `grad_output` - Upstream gradient, shape (batch,) or (batch, 1)
///
/// # Returns
///
/// - `Ok((Tensor, Tensor))` - Gradients with respect to `u` and `v`
/// - `Err(ModelError::InputValidationError)` - If the shapes are inconsistent
pub fn cosine_similarity_backward(
    u: &Tensor,
    v: &Tensor,
    grad_output: &Tensor,
) -> Result<(Tensor, Tensor), ModelError> {
    let u = as_2d(u, "u")?;
    let v = as_2d(v, "v")?;
    check_pair_shapes(u, v)?;
    let grad = as_1d(grad_output, "grad_output")?;
    if grad.len() != u.nrows() {
        return Err(ModelError::InputValidationError(format!(
            "Gradient has {} entries but the batch has {} rows",
            grad.len(),
            u.nrows()
        )));
    }

    let u_norms = row_norms(u);
    let v_norms = row_norms(v);
    let u2 = normalize_rows(u, &u_norms, DEFAULT_NORM_EPSILON);
    let v2 = normalize_rows(v, &v_norms, DEFAULT_NORM_EPSILON);
    let sim = (&u2 * &v2).sum_axis(Axis(1));

    let mut grad_u = Array2::<f32>::zeros(u.raw_dim());
    let mut grad_v = Array2::<f32>::zeros(v.raw_dim());

    for i in 0..u.nrows() {
        let a = u_norms[i] + DEFAULT_NORM_EPSILON;
        let b = v_norms[i] + DEFAULT_NORM_EPSILON;
        let s = sim[i];
        let g = grad[i];

        let mut du = v2.row(i).to_owned();
        if u_norms[i] > 0.0 {
            du.scaled_add(-s / u_norms[i], &u.row(i));
        }
        grad_u.row_mut(i).assign(&(du * (g / a)));

        let mut dv = u2.row(i).to_owned();
        if v_norms[i] > 0.0 {
            dv.scaled_add(-s / v_norms[i], &v.row(i));
        }
        grad_v.row_mut(i).assign(&(dv * (g / b)));
    }

    Ok((grad_u.into_dyn(), grad_v.into_dyn()))
}
