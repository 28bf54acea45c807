use crate::{MatError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub, SubAssign};

/// 矩阵元素类型特征
///
/// 该trait汇总了矩阵算术所需的全部数值约束，
/// 对所有满足约束的类型提供一揽子实现。
pub trait Scalar:
    Copy
    + Default
    + PartialEq
    + Send
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
{
}

impl<T> Scalar for T where
    T: Copy
        + Default
        + PartialEq
        + Send
        + 'static
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + AddAssign
        + SubAssign
{
}

/// 按行主序连续存储的稠密矩阵
///
/// 不变式：elements.len() == n_rows * n_columns，
/// 且两个维度均不为0。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix<T> {
    n_rows: usize,
    n_columns: usize,
    elements: Vec<T>,
}

// 手写反序列化以保证不变式在读入时也成立
impl<'de, T> Deserialize<'de> for Matrix<T>
where
    T: Scalar + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Matrix<T>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw<T> {
            n_rows: usize,
            n_columns: usize,
            elements: Vec<T>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Matrix::from_vec(raw.n_rows, raw.n_columns, raw.elements)
            .map_err(serde::de::Error::custom)
    }
}

impl<T: Scalar> Matrix<T> {
    /// 生成给定维度的零矩阵
    ///
    /// # Errors
    ///
    /// 任一维度为0时返回`MatError::Dimension`
    pub fn new(rows: usize, columns: usize) -> Result<Matrix<T>> {
        if rows == 0 || columns == 0 {
            return Err(MatError::Dimension(format!(
                "matrix size of {}x{} not allowed",
                rows, columns
            )));
        }

        Ok(Matrix {
            n_rows: rows,
            n_columns: columns,
            elements: vec![T::default(); rows * columns],
        })
    }

    /// 根据给定元素（行主序）生成矩阵
    ///
    /// # Errors
    ///
    /// 元素个数与维度不一致时返回`MatError::Dimension`
    pub fn from_vec(rows: usize, columns: usize, elements: Vec<T>) -> Result<Matrix<T>> {
        if rows == 0 || columns == 0 {
            return Err(MatError::Dimension(format!(
                "matrix size of {}x{} not allowed",
                rows, columns
            )));
        }
        if elements.len() != rows * columns {
            return Err(MatError::Dimension(format!(
                "{} elements cannot fill a {}x{} matrix",
                elements.len(),
                rows,
                columns
            )));
        }

        Ok(Matrix {
            n_rows: rows,
            n_columns: columns,
            elements,
        })
    }

    /// 行数
    pub fn rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    pub fn columns(&self) -> usize {
        self.n_columns
    }

    /// 矩阵是否为方阵
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_columns
    }

    /// 复制指定子块，生成独立的新矩阵
    ///
    /// 行区间为`[row_a, row_b)`，列区间为`[column_a, column_b)`，
    /// 返回值不与原矩阵共享存储。
    ///
    /// # Panics
    ///
    /// 区间为空或越界时panic
    pub fn slice(&self, row_a: usize, row_b: usize, column_a: usize, column_b: usize) -> Matrix<T> {
        assert!(
            row_a < row_b && row_b <= self.n_rows,
            "row range [{}, {}) out of bounds",
            row_a,
            row_b
        );
        assert!(
            column_a < column_b && column_b <= self.n_columns,
            "column range [{}, {}) out of bounds",
            column_a,
            column_b
        );

        let row_range = row_b - row_a;
        let column_range = column_b - column_a;

        let mut elements = Vec::with_capacity(row_range * column_range);
        for i in 0..row_range {
            let index = (row_a + i) * self.n_columns + column_a;
            elements.extend_from_slice(&self.elements[index..index + column_range]);
        }

        Matrix {
            n_rows: row_range,
            n_columns: column_range,
            elements,
        }
    }

    /// 交换两行
    ///
    /// # Panics
    ///
    /// 行下标越界时panic
    pub fn exchange_rows(&mut self, row_a: usize, row_b: usize) {
        assert!(
            row_a < self.n_rows && row_b < self.n_rows,
            "row index out of bounds"
        );

        let index_a = row_a * self.n_columns;
        let index_b = row_b * self.n_columns;

        for j in 0..self.n_columns {
            self.elements.swap(index_a + j, index_b + j);
        }
    }

    /// 矩阵加法
    ///
    /// # Errors
    ///
    /// 两矩阵维度不同时返回`MatError::Dimension`
    pub fn checked_add(&self, m: &Matrix<T>) -> Result<Matrix<T>> {
        self.same_dimensions(m)?;

        let mut ms = self.clone();
        for (a, b) in ms.elements.iter_mut().zip(m.elements.iter()) {
            *a += *b;
        }

        Ok(ms)
    }

    /// 矩阵减法
    ///
    /// # Errors
    ///
    /// 两矩阵维度不同时返回`MatError::Dimension`
    pub fn checked_sub(&self, m: &Matrix<T>) -> Result<Matrix<T>> {
        self.same_dimensions(m)?;

        let mut md = self.clone();
        for (a, b) in md.elements.iter_mut().zip(m.elements.iter()) {
            *a -= *b;
        }

        Ok(md)
    }

    /// 矩阵乘法，采用ikj循环顺序
    ///
    /// # Errors
    ///
    /// 左矩阵列数与右矩阵行数不同时返回`MatError::Dimension`
    pub fn checked_mul(&self, m: &Matrix<T>) -> Result<Matrix<T>> {
        if self.n_columns != m.n_rows {
            return Err(MatError::Dimension(format!(
                "cannot multiply {}x{} by {}x{}",
                self.n_rows, self.n_columns, m.n_rows, m.n_columns
            )));
        }

        let mut mp = Matrix::new(self.n_rows, m.n_columns)?;

        for i in 0..self.n_rows {
            let mp_index = i * m.n_columns;
            let index = i * self.n_columns;

            for k in 0..self.n_columns {
                let lhs = self.elements[index + k];
                let m_index = k * m.n_columns;

                for j in 0..m.n_columns {
                    mp.elements[mp_index + j] += lhs * m.elements[m_index + j];
                }
            }
        }

        Ok(mp)
    }

    fn same_dimensions(&self, m: &Matrix<T>) -> Result<()> {
        if self.n_rows != m.n_rows || self.n_columns != m.n_columns {
            return Err(MatError::Dimension(format!(
                "{}x{} does not match {}x{}",
                self.n_rows, self.n_columns, m.n_rows, m.n_columns
            )));
        }
        Ok(())
    }
}

impl<T: Scalar> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (r, c): (usize, usize)) -> &T {
        &self.elements[r * self.n_columns + c]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        &mut self.elements[r * self.n_columns + c]
    }
}

impl<'a, 'b, T: Scalar> Add<&'b Matrix<T>> for &'a Matrix<T> {
    type Output = Matrix<T>;

    /// # Panics
    ///
    /// 维度不同时panic，可失败版本见`checked_add`
    fn add(self, m: &'b Matrix<T>) -> Matrix<T> {
        match self.checked_add(m) {
            Ok(ms) => ms,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<'a, 'b, T: Scalar> Sub<&'b Matrix<T>> for &'a Matrix<T> {
    type Output = Matrix<T>;

    /// # Panics
    ///
    /// 维度不同时panic，可失败版本见`checked_sub`
    fn sub(self, m: &'b Matrix<T>) -> Matrix<T> {
        match self.checked_sub(m) {
            Ok(md) => md,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<'a, 'b, T: Scalar> Mul<&'b Matrix<T>> for &'a Matrix<T> {
    type Output = Matrix<T>;

    /// # Panics
    ///
    /// 维度不匹配时panic，可失败版本见`checked_mul`
    fn mul(self, m: &'b Matrix<T>) -> Matrix<T> {
        match self.checked_mul(m) {
            Ok(mp) => mp,
            Err(e) => panic!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_rejected() {
        assert!(Matrix::<f64>::new(0, 3).is_err());
        assert!(Matrix::<f64>::new(3, 0).is_err());
        assert!(Matrix::<f64>::new(2, 2).is_ok());
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).is_ok());
    }

    #[test]
    fn index_is_row_major() {
        let mut m = Matrix::new(2, 3).unwrap();
        m[(0, 2)] = 5;
        m[(1, 0)] = 7;

        assert_eq!(m[(0, 2)], 5);
        assert_eq!(m[(1, 0)], 7);
        assert_eq!(m[(0, 0)], 0);
    }

    #[test]
    fn slice_is_independent_copy() {
        let m = Matrix::from_vec(4, 4, (1..=16).collect::<Vec<i64>>()).unwrap();

        let mut s = m.slice(0, 2, 2, 4);
        assert_eq!(s.rows(), 2);
        assert_eq!(s.columns(), 2);
        assert_eq!(s[(0, 0)], 3);
        assert_eq!(s[(1, 1)], 8);

        // 修改切片不影响原矩阵
        s[(0, 0)] = 100;
        assert_eq!(m[(0, 2)], 3);
    }

    #[test]
    fn add_sub_elementwise() {
        let a = Matrix::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        let b = Matrix::from_vec(2, 2, vec![5, 6, 7, 8]).unwrap();

        let s = &a + &b;
        assert_eq!(s, Matrix::from_vec(2, 2, vec![6, 8, 10, 12]).unwrap());

        let d = &b - &a;
        assert_eq!(d, Matrix::from_vec(2, 2, vec![4, 4, 4, 4]).unwrap());
    }

    #[test]
    fn mul_known_product() {
        let a = Matrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let b = Matrix::from_vec(3, 2, vec![7, 8, 9, 10, 11, 12]).unwrap();

        let p = &a * &b;
        assert_eq!(p, Matrix::from_vec(2, 2, vec![58, 64, 139, 154]).unwrap());
    }

    #[test]
    fn dimension_mismatch_is_error() {
        let a = Matrix::<i64>::new(2, 3).unwrap();
        let b = Matrix::<i64>::new(2, 2).unwrap();

        assert!(a.checked_add(&b).is_err());
        assert!(a.checked_sub(&b).is_err());
        assert!(b.checked_mul(&a).is_ok());
        assert!(a.checked_mul(&b).is_err());
    }

    #[test]
    fn exchange_rows_swaps() {
        let mut m = Matrix::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        m.exchange_rows(0, 1);
        assert_eq!(m, Matrix::from_vec(2, 2, vec![3, 4, 1, 2]).unwrap());
    }
}
