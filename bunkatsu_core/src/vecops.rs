//! Small dense vector and matrix operations used by the drivers

use num_traits::Float;
use core::ops::{Index, IndexMut};

/// Calculate \\(x^T y\\).
///
/// # Panics
///
/// Panics if `x` and `y` differ in length.
pub fn dot<F: Float>(x: &[F], y: &[F]) -> F
{
    assert_eq!(x.len(), y.len());

    let mut sum = F::zero();
    for (u, v) in x.iter().zip(y) {
        sum = sum + *u * *v;
    }
    sum
}

/// Calculate 2-norm (or euclidean norm) \\(\\|x\\|_2\\).
pub fn norm<F: Float>(x: &[F]) -> F
{
    dot(x, x).sqrt()
}

/// Calculate \\(\alpha x + y\\) into `y`.
///
/// # Panics
///
/// Panics if `x` and `y` differ in length.
pub fn axpy<F: Float>(alpha: F, x: &[F], y: &mut[F])
{
    assert_eq!(x.len(), y.len());

    for (u, v) in x.iter().zip(y) {
        *v = *v + alpha * *u;
    }
}

/// Calculate \\(x - y\\).
///
/// # Panics
///
/// Panics if `x` and `y` differ in length.
pub fn sub<F: Float>(x: &[F], y: &[F]) -> Vec<F>
{
    assert_eq!(x.len(), y.len());

    x.iter().zip(y).map(|(u, v)| *u - *v).collect()
}

/// Compares two values with a combined relative and absolute tolerance.
///
/// Returns `true` if \\(|a - b| \le \max(r \max(|a|, |b|), t)\\),
/// where \\(r\\) is `rel_tol` and \\(t\\) is `abs_tol`.
/// The comparison is symmetric in `a` and `b`.
pub fn is_close<F: Float>(a: F, b: F, rel_tol: F, abs_tol: F) -> bool
{
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }

    let diff = (a - b).abs();
    diff <= (rel_tol * a.abs().max(b.abs())).max(abs_tol)
}

//

/// Compensated summation (Neumaier's variant of Kahan summation).
///
/// Weighted scenario values are accumulated with this so that the result
/// depends on the summation order only through the last bits.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSum<F>
{
    sum: F,
    comp: F,
}

impl<F: Float> WeightedSum<F>
{
    pub fn new() -> Self
    {
        WeightedSum {
            sum: F::zero(),
            comp: F::zero(),
        }
    }

    /// Adds \\(w v\\).
    pub fn add(&mut self, w: F, v: F)
    {
        let term = w * v;
        let t = self.sum + term;
        if self.sum.abs() >= term.abs() {
            self.comp = self.comp + ((self.sum - t) + term);
        }
        else {
            self.comp = self.comp + ((term - t) + self.sum);
        }
        self.sum = t;
    }

    pub fn value(&self) -> F
    {
        self.sum + self.comp
    }
}

impl<F: Float> Default for WeightedSum<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Calculates \\(\sum_i w_i v_i\\) with [`WeightedSum`].
///
/// # Panics
///
/// Panics if `weights` and `values` differ in length.
pub fn weighted_sum<F: Float>(weights: &[F], values: &[F]) -> F
{
    assert_eq!(weights.len(), values.len());

    let mut acc = WeightedSum::new();
    for (w, v) in weights.iter().zip(values) {
        acc.add(*w, *v);
    }
    acc.value()
}

//

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMat<F>
{
    n_row: usize,
    n_col: usize,
    array: Vec<F>,
}

impl<F: Float> DenseMat<F>
{
    /// Creates a zero matrix of `n_row` rows and `n_col` columns.
    pub fn zeros(n_row: usize, n_col: usize) -> Self
    {
        DenseMat {
            n_row,
            n_col,
            array: vec![F::zero(); n_row * n_col],
        }
    }

    /// Creates an identity matrix of size `n`.
    pub fn identity(n: usize) -> Self
    {
        Self::zeros(n, n).by_fn(|r, c| if r == c {F::one()} else {F::zero()})
    }

    /// Creates a matrix from data in row-major order.
    ///
    /// Returns `None` if the length of `array` is not `n_row * n_col`.
    pub fn from_rowmaj(n_row: usize, n_col: usize, array: Vec<F>) -> Option<Self>
    {
        if array.len() != n_row * n_col {
            return None;
        }

        Some(DenseMat {
            n_row,
            n_col,
            array,
        })
    }

    /// Data by a function taking a row and a column.
    pub fn by_fn<M>(mut self, mut func: M) -> Self
    where M: FnMut(usize, usize) -> F
    {
        for r in 0.. self.n_row {
            for c in 0.. self.n_col {
                self[(r, c)] = func(r, c);
            }
        }
        self
    }

    /// Size of the matrix.
    ///
    /// Returns a tuple of a number of rows and columns.
    pub fn size(&self) -> (usize, usize)
    {
        (self.n_row, self.n_col)
    }

    pub fn row(&self, r: usize) -> &[F]
    {
        &self.array[r * self.n_col.. (r + 1) * self.n_col]
    }

    /// Calculates \\(A x\\).
    ///
    /// # Panics
    ///
    /// Panics if the length of `x` differs from the number of columns.
    pub fn mul_vec(&self, x: &[F]) -> Vec<F>
    {
        assert_eq!(x.len(), self.n_col);

        (0.. self.n_row).map(|r| dot(self.row(r), x)).collect()
    }

    /// Calculates \\(A^T y\\).
    ///
    /// # Panics
    ///
    /// Panics if the length of `y` differs from the number of rows.
    pub fn trans_mul_vec(&self, y: &[F]) -> Vec<F>
    {
        assert_eq!(y.len(), self.n_row);

        let mut x = vec![F::zero(); self.n_col];
        for r in 0.. self.n_row {
            axpy(y[r], self.row(r), &mut x);
        }
        x
    }

    /// Calculates \\(A^T A\\).
    pub fn gram(&self) -> DenseMat<F>
    {
        let n = self.n_col;
        let mut g = DenseMat::zeros(n, n);
        for r in 0.. self.n_row {
            let row = self.row(r);
            for i in 0.. n {
                for j in 0.. n {
                    g[(i, j)] = g[(i, j)] + row[i] * row[j];
                }
            }
        }
        g
    }
}

impl<F> Index<(usize, usize)> for DenseMat<F>
{
    type Output = F;

    fn index(&self, (r, c): (usize, usize)) -> &Self::Output
    {
        assert!(r < self.n_row);
        assert!(c < self.n_col);

        &self.array[r * self.n_col + c]
    }
}

impl<F> IndexMut<(usize, usize)> for DenseMat<F>
{
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Self::Output
    {
        assert!(r < self.n_row);
        assert!(c < self.n_col);

        &mut self.array[r * self.n_col + c]
    }
}

//

/// Linear map \\(M\\) appearing in a coupling constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum LinearMap<F>
{
    /// \\(s I\\) of size `dim`.
    ScaledIdentity { dim: usize, scale: F },
    /// General dense matrix.
    Dense(DenseMat<F>),
}

impl<F: Float> LinearMap<F>
{
    pub fn identity(dim: usize) -> Self
    {
        LinearMap::ScaledIdentity { dim, scale: F::one() }
    }

    /// Size of the map as a matrix.
    ///
    /// Returns a tuple of a number of rows and columns.
    pub fn size(&self) -> (usize, usize)
    {
        match self {
            LinearMap::ScaledIdentity { dim, .. } => (*dim, *dim),
            LinearMap::Dense(mat) => mat.size(),
        }
    }

    /// Calculates \\(M x\\).
    ///
    /// # Panics
    ///
    /// Panics if the length of `x` differs from the dimension of the domain.
    pub fn apply(&self, x: &[F]) -> Vec<F>
    {
        match self {
            LinearMap::ScaledIdentity { dim, scale } => {
                assert_eq!(x.len(), *dim);
                x.iter().map(|u| *scale * *u).collect()
            },
            LinearMap::Dense(mat) => mat.mul_vec(x),
        }
    }

    /// Calculates \\(M^T y\\).
    pub fn apply_trans(&self, y: &[F]) -> Vec<F>
    {
        match self {
            LinearMap::ScaledIdentity { .. } => self.apply(y),
            LinearMap::Dense(mat) => mat.trans_mul_vec(y),
        }
    }

    /// Calculates \\(M^T M\\) as a dense matrix.
    pub fn gram(&self) -> DenseMat<F>
    {
        match self {
            LinearMap::ScaledIdentity { dim, scale } => {
                let s2 = *scale * *scale;
                DenseMat::zeros(*dim, *dim).by_fn(|r, c| if r == c {s2} else {F::zero()})
            },
            LinearMap::Dense(mat) => mat.gram(),
        }
    }

    /// Returns the map multiplied by `-1`.
    pub fn neg(&self) -> Self
    {
        match self {
            LinearMap::ScaledIdentity { dim, scale } => LinearMap::ScaledIdentity { dim: *dim, scale: -*scale },
            LinearMap::Dense(mat) => {
                let (nr, nc) = mat.size();
                LinearMap::Dense(DenseMat::zeros(nr, nc).by_fn(|r, c| -mat[(r, c)]))
            },
        }
    }
}

//

/// Solves \\(H u = g\\) for a symmetric positive-definite \\(H\\) by Cholesky factorization.
///
/// Returns `None` if \\(H\\) is not numerically positive-definite.
///
/// # Panics
///
/// Panics if `h` is not square or `g` does not match its size.
pub fn cholesky_solve<F: Float>(h: &DenseMat<F>, g: &[F]) -> Option<Vec<F>>
{
    let (n, n_) = h.size();
    assert_eq!(n, n_);
    assert_eq!(g.len(), n);

    // lower-triangular factor, H = L L^T
    let mut l = DenseMat::zeros(n, n);
    for j in 0.. n {
        let mut d = h[(j, j)];
        for k in 0.. j {
            d = d - l[(j, k)] * l[(j, k)];
        }
        if !(d > F::zero()) {
            return None;
        }
        let d = d.sqrt();
        l[(j, j)] = d;

        for i in j + 1.. n {
            let mut v = h[(i, j)];
            for k in 0.. j {
                v = v - l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = v / d;
        }
    }

    // forward: L w = g
    let mut w = g.to_vec();
    for i in 0.. n {
        for k in 0.. i {
            w[i] = w[i] - l[(i, k)] * w[k];
        }
        w[i] = w[i] / l[(i, i)];
    }

    // backward: L^T u = w
    let mut u = w;
    for i in (0.. n).rev() {
        for k in i + 1.. n {
            u[i] = u[i] - l[(k, i)] * u[k];
        }
        u[i] = u[i] / l[(i, i)];
    }

    Some(u)
}

//
