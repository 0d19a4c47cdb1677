use std::fmt;
use std::ops::{ Index, IndexMut, Mul };
use std::convert::From;

use crate::feq;
use crate::error::{ Result, TracerError };
use crate::tuple::Tuple4D;

/// A 4x4 matrix.
///
/// These matrices encode every transformation in the ray tracer: shapes,
/// patterns and the camera all carry one, along with its precomputed inverse.
/// They transform both vectors and points (`w` components of `0.0` and `1.0`,
/// respectively); translations only ever move points.
///
/// Methods which modify matrices come in pairs: `transpose` works in place,
/// `transposition` returns a new matrix.
///
/// # Examples
///
/// ```
/// # use whitted_tracer::matrix::Matrix4D;
/// let mat = Matrix4D::identity();
/// assert_eq!(mat.determinant(), 1.0);
/// ```
///
/// Calculating a view transformation (for cameras):
///
/// ```
/// # use whitted_tracer::tuple::Tuple4D;
/// # use whitted_tracer::matrix::Matrix4D;
/// let from = Tuple4D::point(0.0, 0.0, 0.0);
/// let to = Tuple4D::point(0.0, 0.0, 5.0);
/// let up = Tuple4D::vector(0.0, 1.0, 0.0);
/// let view = Matrix4D::view_transform(from, to, up);
/// assert_eq!(view, Matrix4D::scaling(-1.0, 1.0, -1.0));
/// ```
#[derive(Copy, Clone, Debug, PartialOrd)]
pub struct Matrix4D {
    data: [f64; 16],
}

/// Element-wise approximate equality.
impl PartialEq for Matrix4D {
    fn eq(&self, other: &Matrix4D) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(x, y)| feq(*x, *y))
    }
}

impl Default for Matrix4D {
    fn default() -> Matrix4D {
        Matrix4D::identity()
    }
}

/// Determinant of an `n`-by-`n` row-major matrix by cofactor expansion along
/// the first row. Only used for `n <= 4`.
fn determinant_n(m: &[f64], n: usize) -> f64 {
    if n == 2 {
        return m[0] * m[3] - m[1] * m[2];
    }

    (0..n).map(|c| m[c] * cofactor_n(m, n, 0, c)).sum()
}

/// Removes row `row` and column `col` from an `n`-by-`n` matrix.
fn submatrix_n(m: &[f64], n: usize, row: usize, col: usize) -> Vec<f64> {
    (0..n).filter(|&r| r != row)
        .flat_map(|r| (0..n).filter(move |&c| c != col).map(move |c| (r, c)))
        .map(|(r, c)| m[r * n + c])
        .collect()
}

fn cofactor_n(m: &[f64], n: usize, row: usize, col: usize) -> f64 {
    let minor = determinant_n(&submatrix_n(m, n, row, col), n - 1);
    if (row + col) % 2 == 0 { minor } else { -minor }
}

impl Matrix4D {
    /// Creates a new `Matrix4D` with every element set to `0.0`.
    pub fn zero() -> Matrix4D {
        Matrix4D { data: [0.0; 16] }
    }

    /// Instantiates a 4x4 identity matrix.
    pub fn identity() -> Matrix4D {
        let mut m = Self::zero();
        for i in 0..4 {
            m[(i, i)] = 1.0;
        }

        m
    }

    /// Offsets a point by `x`, `y` and `z`. Vectors are unaffected.
    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut trans = Self::identity();
        trans[(0, 3)] = x;
        trans[(1, 3)] = y;
        trans[(2, 3)] = z;

        trans
    }

    /// Scales along the X, Y and Z axes. Negative factors reflect.
    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut scale = Self::identity();
        scale[(0, 0)] = x;
        scale[(1, 1)] = y;
        scale[(2, 2)] = z;

        scale
    }

    /// Rotates `r` radians about the X axis.
    ///
    /// ```
    /// # use whitted_tracer::tuple::Tuple4D;
    /// # use whitted_tracer::matrix::Matrix4D;
    /// let m = Matrix4D::rotation_x(std::f64::consts::PI / 2.0);
    /// assert_eq!(m * Tuple4D::point(0.0, 1.0, 0.0), Tuple4D::point(0.0, 0.0, 1.0));
    /// ```
    pub fn rotation_x(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut rotate = Self::identity();
        rotate[(1, 1)] =  cos;
        rotate[(1, 2)] = -sin;
        rotate[(2, 1)] =  sin;
        rotate[(2, 2)] =  cos;

        rotate
    }

    /// Rotates `r` radians about the Y axis.
    pub fn rotation_y(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut rotate = Self::identity();
        rotate[(0, 0)] =  cos;
        rotate[(0, 2)] =  sin;
        rotate[(2, 0)] = -sin;
        rotate[(2, 2)] =  cos;

        rotate
    }

    /// Rotates `r` radians about the Z axis.
    pub fn rotation_z(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut rotate = Self::identity();
        rotate[(0, 0)] =  cos;
        rotate[(0, 1)] = -sin;
        rotate[(1, 0)] =  sin;
        rotate[(1, 1)] =  cos;

        rotate
    }

    /// Rotates `r` radians about an arbitrary axis through the origin.
    ///
    /// The axis is normalized first. Agrees with `rotation_x`/`_y`/`_z` for
    /// the coordinate axes.
    pub fn rotation_axis(axis: Tuple4D, r: f64) -> Matrix4D {
        let k = Tuple4D::vector(axis.x, axis.y, axis.z).normalize();
        let (sin, cos) = r.sin_cos();
        let t = 1.0 - cos;

        Matrix4D::from([
            t * k.x * k.x + cos,       t * k.x * k.y - sin * k.z, t * k.x * k.z + sin * k.y, 0.0,
            t * k.x * k.y + sin * k.z, t * k.y * k.y + cos,       t * k.y * k.z - sin * k.x, 0.0,
            t * k.x * k.z - sin * k.y, t * k.y * k.z + sin * k.x, t * k.z * k.z + cos,       0.0,
            0.0,                       0.0,                       0.0,                       1.0,
        ])
    }

    /// Instantiates a shearing matrix.
    ///
    /// Each parameter moves one component in proportion to another; `xy`
    /// changes `x` in proportion to `y`, `zx` changes `z` in proportion to
    /// `x`, and so on.
    ///
    /// ```
    /// # use whitted_tracer::tuple::Tuple4D;
    /// # use whitted_tracer::matrix::Matrix4D;
    /// let m = Matrix4D::shearing(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    /// assert_eq!(m * Tuple4D::point(2.0, 3.0, 4.0), Tuple4D::point(5.0, 3.0, 4.0));
    /// ```
    pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64)
        -> Matrix4D {
        let mut shear = Self::identity();
        shear[(0, 1)] = xy;
        shear[(0, 2)] = xz;
        shear[(1, 0)] = yx;
        shear[(1, 2)] = yz;
        shear[(2, 0)] = zx;
        shear[(2, 1)] = zy;

        shear
    }

    /// Generates a view transformation.
    ///
    /// `from` is where the eye is, `to` is the point it looks at and `up`
    /// roughly says which way is up. The basis is orthonormalized, so `up`
    /// need not be perpendicular to the line of sight (it must not be parallel
    /// to it).
    ///
    /// The view transformation moves the *world* relative to the eye, not the
    /// other way around.
    pub fn view_transform(from: Tuple4D, to: Tuple4D, up: Tuple4D) -> Matrix4D {
        let forward = (to - from).normalize();
        let left = forward.cross(&up.normalize()).normalize();
        let true_up = left.cross(&forward);

        let mut orientation = Matrix4D::identity();
        for (c, (l, u, f)) in [
            (left.x, true_up.x, forward.x),
            (left.y, true_up.y, forward.y),
            (left.z, true_up.z, forward.z),
        ].iter().enumerate() {
            orientation[(0, c)] = *l;
            orientation[(1, c)] = *u;
            orientation[(2, c)] = -*f;
        }

        orientation * Matrix4D::translation(-from.x, -from.y, -from.z)
    }

    /// Transposes a matrix in place.
    pub fn transpose(&mut self) {
        for r in 0..4 {
            for c in (r + 1)..4 {
                self.data.swap(r * 4 + c, c * 4 + r);
            }
        }
    }

    /// Returns the transpose of a matrix, leaving the original untouched.
    pub fn transposition(&self) -> Matrix4D {
        let mut t = *self;
        t.transpose();
        t
    }

    /// The determinant of the 3x3 matrix left after removing `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> f64 {
        determinant_n(&submatrix_n(&self.data, 4, row, col), 3)
    }

    /// The minor at `row` and `col`, negated when `row + col` is odd.
    pub fn cofactor(&self, row: usize, col: usize) -> f64 {
        cofactor_n(&self.data, 4, row, col)
    }

    pub fn determinant(&self) -> f64 {
        determinant_n(&self.data, 4)
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0
    }

    /// Calculates the inverse of a `Matrix4D`.
    ///
    /// Returns `TracerError::SingularMatrix` when the determinant vanishes.
    pub fn inverse(&self) -> Result<Matrix4D> {
        if !self.is_invertible() {
            return Err(TracerError::SingularMatrix);
        }

        let det = self.determinant();
        let mut inv = Matrix4D::zero();
        for r in 0..4 {
            for c in 0..4 {
                inv[(c, r)] = self.cofactor(r, c) / det;
            }
        }

        Ok(inv)
    }
}

impl From<[f64; 16]> for Matrix4D {
    fn from(data: [f64; 16]) -> Matrix4D {
        Matrix4D { data }
    }
}

impl Index<(usize, usize)> for Matrix4D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[(index.0 * 4) + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix4D {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[(index.0 * 4) + index.1]
    }
}

/// Matrix product. Not commutative: `A * B` generally differs from `B * A`,
/// and chained transforms apply right-to-left.
impl Mul<Matrix4D> for Matrix4D {
    type Output = Matrix4D;

    fn mul(self, other: Matrix4D) -> Matrix4D {
        let mut res = Matrix4D::zero();

        for r in 0..4 {
            for c in 0..4 {
                res[(r, c)] = (0..4).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }

        res
    }
}

/// Transforms a tuple, treated as a column on the right.
impl Mul<Tuple4D> for Matrix4D {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        let row = |r: usize| self[(r, 0)] * t.x
            + self[(r, 1)] * t.y
            + self[(r, 2)] * t.z
            + self[(r, 3)] * t.w;

        Tuple4D::tuple(row(0), row(1), row(2), row(3))
    }
}

impl fmt::Display for Matrix4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            write!(f, "|")?;
            for c in 0..4 {
                write!(f, " {} |", self[(r, c)])?;
            }

            if r != 3 {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

#[test]
fn identity_is_neutral() {
    let i = Matrix4D::identity();
    let a: Matrix4D = [ 0.0, 1.0,  2.0,  4.0,
                        1.0, 2.0,  4.0,  8.0,
                        2.0, 4.0,  8.0, 16.0,
                        4.0, 8.0, 16.0, 32.0, ].into();

    assert_eq!(i * a, a);
    assert_eq!(a * i, a);
}

#[test]
fn transpose_swaps_rows_and_columns() {
     let a: Matrix4D = [ 0.0, 9.0, 3.0, 0.0,
                         9.0, 8.0, 0.0, 8.0,
                         1.0, 8.0, 5.0, 3.0,
                         0.0, 0.0, 5.0, 8.0, ].into();

     let t: Matrix4D = [ 0.0, 9.0, 1.0, 0.0,
                         9.0, 8.0, 8.0, 0.0,
                         3.0, 0.0, 5.0, 5.0,
                         0.0, 8.0, 3.0, 8.0, ].into();

     assert_eq!(t, a.transposition());
     assert_eq!(t.transposition(), a);
     assert_eq!(Matrix4D::identity().transposition(), Matrix4D::identity());
}

#[test]
fn determinant_by_cofactors() {
     let a: Matrix4D = [ -2.0, -8.0,  3.0,  5.0,
                         -3.0,  1.0,  7.0,  3.0,
                          1.0,  2.0, -9.0,  6.0,
                         -6.0,  7.0,  7.0, -9.0, ].into();

     assert_eq!(a.cofactor(0, 0), 690.0);
     assert_eq!(a.cofactor(0, 1), 447.0);
     assert_eq!(a.cofactor(0, 2), 210.0);
     assert_eq!(a.cofactor(0, 3), 51.0);
     assert_eq!(a.determinant(), -4071.0);
}

#[test]
fn inverse_of_matrix() {
     let a: Matrix4D = [  8.0, -5.0,  9.0,  2.0,
                          7.0,  5.0,  6.0,  1.0,
                         -6.0,  0.0,  9.0,  6.0,
                         -3.0,  0.0, -9.0, -4.0, ].into();

     let i: Matrix4D = [ -0.15385, -0.15385, -0.28205, -0.53846,
                         -0.07692,  0.12308,  0.02564,  0.03077,
                          0.35897,  0.35897,  0.43590,  0.92308,
                         -0.69231, -0.69231, -0.76923, -1.92308, ].into();

     assert_eq!(a.inverse().unwrap(), i);
     assert_eq!(a * a.inverse().unwrap(), Matrix4D::identity());
}

#[test]
fn singular_matrix_has_no_inverse() {
     let a: Matrix4D = [ -4.0,  2.0, -2.0, -3.0,
                          9.0,  6.0,  2.0,  6.0,
                          0.0, -5.0,  1.0, -5.0,
                          0.0,  0.0,  0.0,  0.0, ].into();

     assert!(!a.is_invertible());
     assert!(matches!(a.inverse(), Err(TracerError::SingularMatrix)));
     assert!(Matrix4D::scaling(0.0, 1.0, 1.0).inverse().is_err());
}

#[test]
fn product_times_inverse_restores() {
     let a: Matrix4D = [  3.0, -9.0,  7.0,  3.0,
                          3.0,  8.0,  2.0, -9.0,
                         -4.0,  4.0,  4.0,  1.0,
                         -6.0,  5.0, -1.0,  1.0, ].into();

     let b: Matrix4D = [ 8.0,  2.0, 2.0, 2.0,
                         3.0, -1.0, 7.0, 0.0,
                         7.0,  0.0, 5.0, 4.0,
                         6.0, -2.0, 0.0, 5.0  ].into();

     assert_eq!(a, (a * b) * b.inverse().unwrap());
}

#[test]
fn inverse_round_trips_points() {
    let transforms = [
        Matrix4D::translation(5.0, -3.0, 2.0),
        Matrix4D::scaling(2.0, 3.0, 4.0),
        Matrix4D::rotation_x(0.3) * Matrix4D::rotation_y(1.1),
        Matrix4D::shearing(1.0, 0.0, 0.5, 0.0, 0.0, 2.0),
        Matrix4D::translation(1.0, 2.0, 3.0) * Matrix4D::rotation_z(2.0)
            * Matrix4D::scaling(0.5, 5.0, 1.0),
    ];
    let p = Tuple4D::point(-3.0, 4.0, 5.0);

    for m in transforms.iter() {
        assert_eq!(m.inverse().unwrap() * (*m * p), p);
    }
}

#[test]
fn translation_ignores_vectors() {
    let transform = Matrix4D::translation(5.0, -3.0, 2.0);
    let point = Tuple4D::point(-3.0, 4.0, 5.0);
    let vector = Tuple4D::vector(-3.0, 4.0, 5.0);

    assert_eq!(transform * point, Tuple4D::point(2.0, 1.0, 7.0));
    assert_eq!(transform * vector, vector);
}

#[test]
fn scaling_reflects_with_negative_factor() {
    let transform = Matrix4D::scaling(-1.0, 1.0, 1.0);
    let point = Tuple4D::point(2.0, 3.0, 4.0);

    assert_eq!(transform * point, Tuple4D::point(-2.0, 3.0, 4.0));
}

#[test]
fn rotations_about_each_axis() {
    let h = 2.0f64.sqrt() / 2.0;
    let quarter = std::f64::consts::PI / 2.0;

    assert_eq!(Matrix4D::rotation_x(quarter / 2.0) * Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(0.0, h, h));
    assert_eq!(Matrix4D::rotation_y(quarter) * Tuple4D::point(0.0, 0.0, 1.0),
        Tuple4D::point(1.0, 0.0, 0.0));
    assert_eq!(Matrix4D::rotation_z(quarter / 2.0) * Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-h, h, 0.0));
}

#[test]
fn shear_each_component() {
    let p = Tuple4D::point(2.0, 3.0, 4.0);

    assert_eq!(Matrix4D::shearing(0.0, 1.0, 0.0, 0.0, 0.0, 0.0) * p,
        Tuple4D::point(6.0, 3.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 1.0, 0.0, 0.0, 0.0) * p,
        Tuple4D::point(2.0, 5.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 1.0, 0.0, 0.0) * p,
        Tuple4D::point(2.0, 7.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 1.0, 0.0) * p,
        Tuple4D::point(2.0, 3.0, 6.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 0.0, 1.0) * p,
        Tuple4D::point(2.0, 3.0, 7.0));
}

#[test]
fn chained_transforms_apply_right_to_left() {
    let a = Matrix4D::rotation_x(std::f64::consts::PI / 2.0);
    let b = Matrix4D::scaling(5.0, 5.0, 5.0);
    let c = Matrix4D::translation(10.0, 5.0, 7.0);

    assert_eq!((c * b * a) * Tuple4D::point(1.0, 0.0, 1.0),
        Tuple4D::point(15.0, 0.0, 7.0));
}

#[test]
fn default_view_is_identity() {
    let from = Tuple4D::point(0.0, 0.0, 0.0);
    let to = Tuple4D::point(0.0, 0.0, -1.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(Matrix4D::identity(), Matrix4D::view_transform(from, to, up));
}

#[test]
fn view_moves_world() {
    let from = Tuple4D::point(0.0, 0.0, 8.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(Matrix4D::view_transform(from, to, up),
        Matrix4D::translation(0.0, 0.0, -8.0));
}

#[test]
fn arbitrary_view_is_orthonormal() {
    let from = Tuple4D::point(1.0, 3.0, 2.0);
    let to = Tuple4D::point(4.0, -2.0, 8.0);
    let up = Tuple4D::vector(1.0, 1.0, 0.0);

    let a: Matrix4D = [ -0.51450, 0.51450,  0.68599, -2.40098,
                         0.77892, 0.61494,  0.12299, -2.86972,
                        -0.35857, 0.59761, -0.71714,  0.00000,
                         0.00000, 0.00000,  0.00000,  1.00000, ].into();

    assert_eq!(Matrix4D::view_transform(from, to, up), a);
}

#[test]
fn axis_rotation_matches_principal_axes() {
    let r = 0.7;

    assert_eq!(Matrix4D::rotation_axis(Tuple4D::vector(1.0, 0.0, 0.0), r),
        Matrix4D::rotation_x(r));
    assert_eq!(Matrix4D::rotation_axis(Tuple4D::vector(0.0, 2.0, 0.0), r),
        Matrix4D::rotation_y(r));
    assert_eq!(Matrix4D::rotation_axis(Tuple4D::vector(0.0, 0.0, 1.0), r),
        Matrix4D::rotation_z(r));
}

#[test]
fn axis_rotation_about_diagonal_cycles_axes() {
    let m = Matrix4D::rotation_axis(Tuple4D::vector(1.0, 1.0, 1.0),
        2.0 * std::f64::consts::PI / 3.0);

    assert_eq!(m * Tuple4D::vector(1.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn tiny_scaling_is_invertible() {
    let m = Matrix4D::scaling(1.0e-6, 1.0e-6, 1.0e-6);

    assert!(m.is_invertible());
    assert_eq!(m.inverse().unwrap(), Matrix4D::scaling(1.0e6, 1.0e6, 1.0e6));
    assert_eq!(m * m.inverse().unwrap(), Matrix4D::identity());
}
