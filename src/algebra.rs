//! 该模块提供纯串行的行化简算法：rref、求逆与行列式
//!
//! 消元过程中被消去的元素会被显式置零，
//! 因此零测试使用精确相等而非容差比较。

use crate::matrix::{Matrix, Scalar};
use crate::{MatError, Result};
use std::ops::{Div, Neg};

/// 行化简所需的可除元素类型
pub trait Field: Scalar + Div<Output = Self> + Neg<Output = Self> + PartialOrd {
    /// 乘法单位元
    fn one() -> Self;
}

impl Field for f32 {
    fn one() -> f32 {
        1.0
    }
}

impl Field for f64 {
    fn one() -> f64 {
        1.0
    }
}

/// 计算简化行阶梯形矩阵
pub fn rref<T: Field>(m: &Matrix<T>) -> Matrix<T> {
    let mut mr = m.clone();

    zeros_under_pivots(&mut mr);
    zeros_above_pivots(&mut mr);
    divide_rows_by_pivots(&mut mr);

    mr
}

/// 用Gauss-Jordan消元对[M | I]增广矩阵求逆
///
/// # Errors
///
/// 非方阵时返回`MatError::Dimension`，
/// 前向消元后主对角线出现零（矩阵奇异）时返回`MatError::Singular`
pub fn inverse<T: Field>(m: &Matrix<T>) -> Result<Matrix<T>> {
    if !m.is_square() {
        return Err(MatError::Dimension(format!(
            "cannot invert a {}x{} matrix",
            m.rows(),
            m.columns()
        )));
    }

    let n = m.rows();

    // 构造增广矩阵[M | I]
    let mut ma = Matrix::new(n, 2 * n)?;
    for i in 0..n {
        for j in 0..n {
            ma[(i, j)] = m[(i, j)];
        }
        ma[(i, n + i)] = T::one();
    }

    zeros_under_pivots(&mut ma);

    if has_main_diagonal_zero(&ma) {
        return Err(MatError::Singular);
    }

    zeros_above_pivots(&mut ma);
    divide_rows_by_pivots(&mut ma);

    // 右半即为逆矩阵
    Ok(ma.slice(0, n, n, 2 * n))
}

/// 通过前向消元计算行列式，符号随行交换翻转
///
/// # Errors
///
/// 非方阵时返回`MatError::Dimension`
pub fn determinant<T: Field>(m: &Matrix<T>) -> Result<T> {
    if !m.is_square() {
        return Err(MatError::Dimension(format!(
            "no determinant for a {}x{} matrix",
            m.rows(),
            m.columns()
        )));
    }

    let mut md = m.clone();
    let sign = zeros_under_pivots(&mut md);

    let mut det = sign;
    for i in 0..md.rows() {
        det = det * md[(i, i)];
    }

    Ok(det)
}

/// 主对角线元素为零时向下寻找非零行并交换，返回是否发生了交换
fn diagonal_partial_sort<T: Field>(m: &mut Matrix<T>, row: usize) -> bool {
    if row >= m.columns() || m[(row, row)] != T::default() {
        return false;
    }

    for i in row + 1..m.rows() {
        if m[(i, row)] != T::default() {
            m.exchange_rows(i, row);
            return true;
        }
    }

    false
}

/// 前向消元：在每个主元下方形成零，返回行交换累积的符号
fn zeros_under_pivots<T: Field>(m: &mut Matrix<T>) -> T {
    let last_row = m.rows();
    let last_col = m.columns();

    let mut sign = T::one();

    for row in 0..last_row {
        if diagonal_partial_sort(m, row) {
            sign = -sign;
        }

        // 主元可能右移到对角线之后
        for col in row..last_col {
            if m[(row, col)] != T::default() {
                let pivot = m[(row, col)];

                for i in row + 1..last_row {
                    let multiplier = m[(i, col)] / pivot;

                    for j in col + 1..last_col {
                        let delta = m[(row, j)] * multiplier;
                        m[(i, j)] -= delta;
                    }

                    m[(i, col)] = T::default();
                }

                break;
            }
        }
    }

    sign
}

/// 回代消元：在每个主元上方形成零
fn zeros_above_pivots<T: Field>(m: &mut Matrix<T>) {
    let last_col = m.columns();

    for row in 1..m.rows() {
        for col in row..last_col {
            if m[(row, col)] != T::default() {
                let pivot = m[(row, col)];

                for i in (0..row).rev() {
                    let multiplier = m[(i, col)] / pivot;

                    for j in col + 1..last_col {
                        let delta = m[(row, j)] * multiplier;
                        m[(i, j)] -= delta;
                    }

                    m[(i, col)] = T::default();
                }

                break;
            }
        }
    }
}

/// 每行除以自己的主元，使主元归一
fn divide_rows_by_pivots<T: Field>(m: &mut Matrix<T>) {
    let last_col = m.columns();

    for i in 0..m.rows() {
        for j in 0..last_col {
            if m[(i, j)] != T::default() {
                let divisor = m[(i, j)];

                for k in j..last_col {
                    m[(i, k)] = m[(i, k)] / divisor;
                }

                break;
            }
        }
    }
}

fn has_main_diagonal_zero<T: Field>(m: &Matrix<T>) -> bool {
    let last_diagonal = m.rows().min(m.columns());

    (0..last_diagonal).any(|i| m[(i, i)] == T::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix<f64>, b: &Matrix<f64>, epsilon: f64) {
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.columns(), b.columns());

        for i in 0..a.rows() {
            for j in 0..a.columns() {
                assert!(
                    (a[(i, j)] - b[(i, j)]).abs() < epsilon,
                    "element ({}, {}): {} vs {}",
                    i,
                    j,
                    a[(i, j)],
                    b[(i, j)]
                );
            }
        }
    }

    #[test]
    fn rref_of_known_matrix() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let reduced = rref(&m);
        let expected = Matrix::from_vec(2, 3, vec![1.0, 0.0, -1.0, 0.0, 1.0, 2.0]).unwrap();
        assert_close(&reduced, &expected, 1e-12);
    }

    #[test]
    fn rref_of_dependent_rows() {
        let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();

        let reduced = rref(&m);
        let expected = Matrix::from_vec(2, 2, vec![1.0, 2.0, 0.0, 0.0]).unwrap();
        assert_close(&reduced, &expected, 1e-12);
    }

    #[test]
    fn inverse_round_trip_is_identity() {
        let p = Matrix::from_vec(2, 2, vec![4.0, 7.0, 2.0, 6.0]).unwrap();

        let q = inverse(&p).unwrap();
        let expected = Matrix::from_vec(2, 2, vec![0.6, -0.7, -0.2, 0.4]).unwrap();
        assert_close(&q, &expected, 1e-12);

        let product = p.checked_mul(&q).unwrap();
        let identity = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_close(&product, &identity, 1e-12);
    }

    #[test]
    fn inverse_of_singular_matrix_is_error() {
        let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();

        match inverse(&m) {
            Err(MatError::Singular) => {}
            other => panic!("expected Singular, got {:?}", other),
        }
    }

    #[test]
    fn inverse_of_non_square_is_error() {
        let m = Matrix::<f64>::new(2, 3).unwrap();
        assert!(inverse(&m).is_err());
    }

    #[test]
    fn determinant_of_diagonal_matrix() {
        let m = Matrix::from_vec(2, 2, vec![2.0, 0.0, 0.0, 3.0]).unwrap();
        assert_eq!(determinant(&m).unwrap(), 6.0);
    }

    #[test]
    fn determinant_sign_flips_on_row_exchange() {
        let m = Matrix::from_vec(2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(determinant(&m).unwrap(), -1.0);
    }

    #[test]
    fn determinant_of_singular_matrix_is_zero() {
        let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(determinant(&m).unwrap(), 0.0);
    }

    #[test]
    fn determinant_of_non_square_is_error() {
        let m = Matrix::<f64>::new(2, 3).unwrap();
        assert!(determinant(&m).is_err());
    }
}
