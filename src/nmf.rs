//! Non-negative matrix factorization.
//!
//! Decomposes a document-term matrix X (D x V) into a projection W (D x K)
//! and components H (K x V) with X ≈ WH, using multiplicative updates for the
//! Frobenius loss.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::config::{Init, NmfConfig};
use crate::error::{Result, TopicError};

const EPSILON: f64 = 1e-10;
// NNDSVD entries below this are treated as zero.
const NNDSVD_FLOOR: f64 = 1e-6;
const POWER_ITERATIONS: usize = 200;
const CONVERGENCE_CHECK_EVERY: usize = 10;

#[derive(Debug, Clone)]
pub struct Factorization {
    pub components: Array2<f64>, // Topics x Terms
    pub projection: Array2<f64>, // Documents x Topics
    pub reconstruction_err: f64, // Frobenius norm of X - WH
    pub iterations: usize,
}

pub struct Nmf {
    config: NmfConfig,
}

impl Nmf {
    pub fn new(config: NmfConfig) -> Self {
        Nmf { config }
    }

    pub fn fit(&self, x: &Array2<f64>) -> Result<Factorization> {
        let (n_docs, n_terms) = x.dim();
        let k = self.config.n_topics;

        if n_docs == 0 {
            return Err(TopicError::EmptyInput("document-term matrix has no rows"));
        }
        if n_terms == 0 {
            return Err(TopicError::EmptyInput("document-term matrix has no columns"));
        }
        if k == 0 {
            return Err(TopicError::InvalidConfig("n_topics must be at least 1".into()));
        }
        if x.iter().any(|&v| !(v >= 0.0)) {
            return Err(TopicError::InvalidConfig(
                "document-term matrix must be finite and non-negative".into(),
            ));
        }

        let (mut w, mut h) = self.initialize(x)?;

        let error_at_init = frobenius_error(x, &w, &h);
        let mut previous_error = error_at_init;
        let mut iterations = 0;

        debug!(init = ?self.config.init, error_at_init, "Initialized factors");

        for iter in 1..=self.config.max_iter {
            iterations = iter;

            // W <- W * (X H^T) / (W H H^T)
            let ht = h.t();
            let numerator = x.dot(&ht);
            let denominator = w.dot(&h.dot(&ht));
            w.zip_mut_with(&numerator, |w_ij, &num| *w_ij *= num);
            w.zip_mut_with(&denominator, |w_ij, &den| *w_ij /= den + EPSILON);

            // H <- H * (W^T X) / (W^T W H)
            let wt = w.t();
            let numerator = wt.dot(x);
            let denominator = wt.dot(&w).dot(&h);
            h.zip_mut_with(&numerator, |h_ij, &num| *h_ij *= num);
            h.zip_mut_with(&denominator, |h_ij, &den| *h_ij /= den + EPSILON);

            if iter % CONVERGENCE_CHECK_EVERY == 0 {
                let error = frobenius_error(x, &w, &h);
                if error_at_init <= 0.0 || (previous_error - error) / error_at_init < self.config.tol {
                    debug!(iter, error, "Converged");
                    break;
                }
                previous_error = error;
            }
        }

        let reconstruction_err = frobenius_error(x, &w, &h);
        info!(
            topics = k,
            iterations,
            reconstruction_err,
            "Factorized document-term matrix"
        );

        Ok(Factorization {
            components: h,
            projection: w,
            reconstruction_err,
            iterations,
        })
    }

    fn initialize(&self, x: &Array2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        let k = self.config.n_topics;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None if self.config.init == Init::Random => StdRng::from_entropy(),
            None => StdRng::seed_from_u64(0),
        };

        match self.config.init {
            Init::Random => Ok(random_init(x, k, &mut rng)),
            Init::Nndsvd => Ok(nndsvd_init(x, k, &mut rng, false)),
            Init::Nndsvda => Ok(nndsvd_init(x, k, &mut rng, true)),
        }
    }
}

fn mean(x: &Array2<f64>) -> f64 {
    x.mean().unwrap_or(0.0)
}

fn random_init(x: &Array2<f64>, k: usize, rng: &mut StdRng) -> (Array2<f64>, Array2<f64>) {
    let (n_docs, n_terms) = x.dim();
    let scale = (mean(x) / k as f64).sqrt();

    let mut draw = |_: (usize, usize)| {
        let z: f64 = rng.sample(StandardNormal);
        scale * z.abs()
    };
    let h = Array2::from_shape_fn((k, n_terms), &mut draw);
    let w = Array2::from_shape_fn((n_docs, k), &mut draw);
    (w, h)
}

fn nndsvd_init(
    x: &Array2<f64>,
    k: usize,
    rng: &mut StdRng,
    fill_zeros: bool,
) -> (Array2<f64>, Array2<f64>) {
    let (n_docs, n_terms) = x.dim();
    let (u, s, vt) = truncated_svd(x, k, rng);

    let mut w = Array2::<f64>::zeros((n_docs, k));
    let mut h = Array2::<f64>::zeros((k, n_terms));

    for j in 0..k {
        let x_col = u.column(j);
        let y_row = vt.row(j);

        if j == 0 {
            let root = s[0].sqrt();
            w.column_mut(0).assign(&x_col.mapv(|v| root * v.abs()));
            h.row_mut(0).assign(&y_row.mapv(|v| root * v.abs()));
            continue;
        }

        let x_pos = x_col.mapv(|v| v.max(0.0));
        let x_neg = x_col.mapv(|v| (-v).max(0.0));
        let y_pos = y_row.mapv(|v| v.max(0.0));
        let y_neg = y_row.mapv(|v| (-v).max(0.0));

        let (x_pos_norm, y_pos_norm) = (norm(&x_pos), norm(&y_pos));
        let (x_neg_norm, y_neg_norm) = (norm(&x_neg), norm(&y_neg));
        let pos_mass = x_pos_norm * y_pos_norm;
        let neg_mass = x_neg_norm * y_neg_norm;

        let (u_part, v_part, sigma) = if pos_mass > neg_mass {
            (scaled(x_pos, x_pos_norm), scaled(y_pos, y_pos_norm), pos_mass)
        } else {
            (scaled(x_neg, x_neg_norm), scaled(y_neg, y_neg_norm), neg_mass)
        };

        let lambda = (s[j] * sigma).sqrt();
        w.column_mut(j).assign(&(u_part * lambda));
        h.row_mut(j).assign(&(v_part * lambda));
    }

    w.mapv_inplace(|v| if v < NNDSVD_FLOOR { 0.0 } else { v });
    h.mapv_inplace(|v| if v < NNDSVD_FLOOR { 0.0 } else { v });

    if fill_zeros {
        let avg = mean(x);
        w.mapv_inplace(|v| if v == 0.0 { avg } else { v });
        h.mapv_inplace(|v| if v == 0.0 { avg } else { v });
    }

    (w, h)
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

fn scaled(v: Array1<f64>, norm: f64) -> Array1<f64> {
    if norm > 0.0 {
        v / norm
    } else {
        v
    }
}

/// Leading `k` singular triplets of `x` by power iteration with deflation
/// through orthogonalization against the vectors already found.
///
/// Returns U (D x k), singular values (k) and V^T (k x V). Directions beyond
/// the rank of `x` come back as zero vectors with a zero singular value.
fn truncated_svd(
    x: &Array2<f64>,
    k: usize,
    rng: &mut StdRng,
) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let (n_docs, n_terms) = x.dim();
    let mut u = Array2::<f64>::zeros((n_docs, k));
    let mut s = Array1::<f64>::zeros(k);
    let mut vt = Array2::<f64>::zeros((k, n_terms));

    for j in 0..k {
        let mut v = Array1::from_shape_fn(n_terms, |_| rng.gen_range(0.1..1.0));
        orthogonalize(&mut v, &vt, j);
        let start_norm = norm(&v);
        if start_norm <= EPSILON {
            continue;
        }
        v /= start_norm;

        for _ in 0..POWER_ITERATIONS {
            let left = x.dot(&v);
            let mut next = x.t().dot(&left);
            orthogonalize(&mut next, &vt, j);
            let next_norm = norm(&next);
            if next_norm <= EPSILON {
                v.fill(0.0);
                break;
            }
            next /= next_norm;
            let delta = (&next - &v).mapv(f64::abs).sum();
            v = next;
            if delta < 1e-12 {
                break;
            }
        }

        let mut left = x.dot(&v);
        let sigma = norm(&left);
        if sigma <= EPSILON {
            continue;
        }
        left /= sigma;

        u.column_mut(j).assign(&left);
        s[j] = sigma;
        vt.row_mut(j).assign(&v);
    }

    (u, s, vt)
}

fn orthogonalize(v: &mut Array1<f64>, basis: &Array2<f64>, found: usize) {
    for row in basis.axis_iter(Axis(0)).take(found) {
        let projection = row.dot(&*v);
        v.scaled_add(-projection, &row);
    }
}

/// ||X - WH||_F from ||X||² - 2·tr(Wᵀ X Hᵀ) + tr((WᵀW)(HHᵀ)), which only
/// allocates D x K and K x K intermediates.
fn frobenius_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let x_norm_sq: f64 = x.iter().map(|v| v * v).sum();
    let cross: f64 = (w * &x.dot(&h.t())).sum();
    let gram: f64 = (&w.t().dot(w) * &h.dot(&h.t())).sum();
    (x_norm_sq - 2.0 * cross + gram).max(0.0).sqrt()
}
