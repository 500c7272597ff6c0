use nalgebra::{Matrix3, MatrixXx3, Vector3};

use crate::error::{MpmError, Result};

pub type Real = f64;

pub type Vector = Vector3<Real>;
pub type Matrix = Matrix3<Real>;
pub type IVector = Vector3<i64>;

/// N x 3 table of particle positions, one row per particle.
pub type PositionTable = MatrixXx3<Real>;

/// Iteration cap handed to the SVD; non-convergence is reported, never looped on.
const SVD_MAX_ITERATIONS: usize = 256;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vector::zeros()
}

#[inline(always)]
pub fn repeat_vector(value: Real) -> Vector {
    Vector::repeat(value)
}

#[inline(always)]
pub fn zero_matrix() -> Matrix {
    Matrix::zeros()
}

#[inline(always)]
pub fn identity_matrix() -> Matrix {
    Matrix::identity()
}

#[inline(always)]
pub fn diagonal_from_value(value: Real) -> Matrix {
    Matrix::from_diagonal_element(value)
}

#[inline(always)]
pub fn diagonal_from_vec(vec: Vector) -> Matrix {
    Matrix::from_diagonal(&vec)
}

/// Element-wise square.
#[inline(always)]
pub fn sqr(v: Vector) -> Vector {
    v.component_mul(&v)
}

#[inline(always)]
pub fn outer_product(a: Vector, b: Vector) -> Matrix {
    a * b.transpose()
}

#[inline(always)]
pub fn matrix_determinant(m: &Matrix) -> Real {
    m.determinant()
}

/// Singular value decomposition `F = U * diag(sigma) * V^T`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Svd3 {
    pub u: Matrix,
    pub sigma: Vector,
    pub v: Matrix,
}

impl Svd3 {
    pub fn recompose(&self) -> Matrix {
        self.u * diagonal_from_vec(self.sigma) * self.v.transpose()
    }
}

pub fn svd3(m: &Matrix) -> Result<Svd3> {
    let svd = m
        .try_svd(true, true, Real::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(MpmError::Decomposition { particle: None })?;

    match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => Ok(Svd3 {
            u,
            sigma: svd.singular_values,
            v: v_t.transpose(),
        }),
        _ => Err(MpmError::Decomposition { particle: None }),
    }
}

/// Polar decomposition `F = R * S` with `R` orthogonal and `S` symmetric.
pub fn polar(f: &Matrix) -> Result<(Matrix, Matrix)> {
    let Svd3 { u, sigma, v } = svd3(f)?;
    let rotation = u * v.transpose();
    let stretch = v * diagonal_from_vec(sigma) * v.transpose();
    Ok((rotation, stretch))
}
