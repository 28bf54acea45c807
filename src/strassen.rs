//! 该模块提供Strassen分治矩阵乘法的串行与并行实现
//!
//! 两个深度参数控制行为：`r`限制递归分解的层数，
//! `p`限制其中通过线程池并行派发的层数。
//! 并行派发只在`p`降到0的那一层发生一次，
//! 派发出去的七个子积全部是串行实例，内部不再向线程池提交任务，
//! 因此工作线程之间不会互相等待，不会因线程池耗尽而死锁。

use crate::matrix::{Matrix, Scalar};
use crate::task_pool::TaskPool;
use crate::{MatError, Result};

/// 串行Strassen乘法器
///
/// 持有两个操作数与剩余递归深度`r`，单次调用消耗自身。
pub struct Strassen<T> {
    a: Matrix<T>,
    b: Matrix<T>,
    r: usize,
}

impl<T: Scalar> Strassen<T> {
    /// 生成串行乘法器
    ///
    /// # Errors
    ///
    /// 操作数不是同维方阵时返回`MatError::Dimension`
    pub fn new(a: Matrix<T>, b: Matrix<T>, r: usize) -> Result<Strassen<T>> {
        check_operands(&a, &b)?;
        Ok(Strassen { a, b, r })
    }

    /// 在调用线程内计算乘积
    pub fn run(self) -> Result<Matrix<T>> {
        serial_product(self.a, self.b, self.r)
    }
}

/// 并行Strassen乘法器
///
/// 在串行版本的基础上增加并行深度`p`与线程池引用。
pub struct ParallelStrassen<'p, T> {
    a: Matrix<T>,
    b: Matrix<T>,
    r: usize,
    p: usize,
    pool: &'p TaskPool,
}

impl<'p, T: Scalar> ParallelStrassen<'p, T> {
    /// 生成并行乘法器
    ///
    /// # Errors
    ///
    /// 操作数不是同维方阵时返回`MatError::Dimension`
    pub fn new(
        a: Matrix<T>,
        b: Matrix<T>,
        r: usize,
        p: usize,
        pool: &'p TaskPool,
    ) -> Result<ParallelStrassen<'p, T>> {
        check_operands(&a, &b)?;
        Ok(ParallelStrassen { a, b, r, p, pool })
    }

    /// 计算乘积，在前`p`层递归把七个子积派发给线程池
    ///
    /// # Errors
    ///
    /// 派发出去的任务panic或被线程池丢弃时返回相应错误
    pub fn run(self) -> Result<Matrix<T>> {
        parallel_product(self.a, self.b, self.r, self.p, self.pool)
    }
}

fn check_operands<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    if a.rows() != b.rows() || a.rows() != b.columns() || a.columns() != b.columns() {
        return Err(MatError::Dimension(format!(
            "incorrect dimensions for a Strassen product: {}x{} and {}x{}",
            a.rows(),
            a.columns(),
            b.rows(),
            b.columns()
        )));
    }
    Ok(())
}

/// 操作数的四个象限切片
fn quadrants<T: Scalar>(m: &Matrix<T>, h: usize) -> (Matrix<T>, Matrix<T>, Matrix<T>, Matrix<T>) {
    (
        m.slice(0, h, 0, h),
        m.slice(0, h, h, 2 * h),
        m.slice(h, 2 * h, 0, h),
        m.slice(h, 2 * h, h, 2 * h),
    )
}

/// 用七个子积组装结果矩阵
///
/// C11 = M1+M4-M5+M7, C12 = M3+M5, C21 = M2+M4, C22 = M1-M2+M3+M6
fn recombine<T: Scalar>(n: usize, h: usize, m: [&Matrix<T>; 7]) -> Result<Matrix<T>> {
    let [m1, m2, m3, m4, m5, m6, m7] = m;

    let mut c = Matrix::new(n, n)?;

    for i in 0..h {
        for j in 0..h {
            c[(i, j)] = m1[(i, j)] + m4[(i, j)] - m5[(i, j)] + m7[(i, j)];
            c[(i, h + j)] = m3[(i, j)] + m5[(i, j)];
            c[(h + i, j)] = m2[(i, j)] + m4[(i, j)];
            c[(h + i, h + j)] = m1[(i, j)] - m2[(i, j)] + m3[(i, j)] + m6[(i, j)];
        }
    }

    Ok(c)
}

fn serial_product<T: Scalar>(a: Matrix<T>, b: Matrix<T>, r: usize) -> Result<Matrix<T>> {
    let n = a.rows();

    // 深度耗尽或维度为奇数时直接做ikj乘法，奇数维无法对半分块
    if r == 0 || n % 2 != 0 {
        return a.checked_mul(&b);
    }

    let h = n / 2;
    let (a11, a12, a21, a22) = quadrants(&a, h);
    let (b11, b12, b21, b22) = quadrants(&b, h);

    let r = r - 1;

    let m1 = serial_product(&a11 + &a22, &b11 + &b22, r)?;
    let m2 = serial_product(&a21 + &a22, b11.clone(), r)?;
    let m3 = serial_product(a11.clone(), &b12 - &b22, r)?;
    let m4 = serial_product(a22.clone(), &b21 - &b11, r)?;
    let m5 = serial_product(&a11 + &a12, b22.clone(), r)?;
    let m6 = serial_product(&a21 - &a11, &b11 + &b12, r)?;
    let m7 = serial_product(&a12 - &a22, &b21 + &b22, r)?;

    recombine(n, h, [&m1, &m2, &m3, &m4, &m5, &m6, &m7])
}

fn parallel_product<T: Scalar>(
    a: Matrix<T>,
    b: Matrix<T>,
    r: usize,
    p: usize,
    pool: &TaskPool,
) -> Result<Matrix<T>> {
    let n = a.rows();

    if r == 0 || n % 2 != 0 {
        return a.checked_mul(&b);
    }

    let h = n / 2;
    let (a11, a12, a21, a22) = quadrants(&a, h);
    let (b11, b12, b21, b22) = quadrants(&b, h);

    let r = r - 1;

    let (m1, m2, m3, m4, m5, m6, m7) = if p == 0 {
        // 到达派发层：七个子积作为串行任务提交线程池。
        // 任务内部只做串行递归，绝不回头向线程池提交，
        // 否则工作线程可能全部阻塞在等待彼此的future上。
        let submit = |a: Matrix<T>, b: Matrix<T>| pool.submit_front(move || Strassen { a, b, r }.run());

        let f1 = submit(&a11 + &a22, &b11 + &b22);
        let f2 = submit(&a21 + &a22, b11.clone());
        let f3 = submit(a11.clone(), &b12 - &b22);
        let f4 = submit(a22.clone(), &b21 - &b11);
        let f5 = submit(&a11 + &a12, b22.clone());
        let f6 = submit(&a21 - &a11, &b11 + &b12);
        let f7 = submit(&a12 - &a22, &b21 + &b22);

        (
            f1.wait()??,
            f2.wait()??,
            f3.wait()??,
            f4.wait()??,
            f5.wait()??,
            f6.wait()??,
            f7.wait()??,
        )
    } else {
        // 尚未到派发层：同步递归，只递减p
        let p = p - 1;

        (
            parallel_product(&a11 + &a22, &b11 + &b22, r, p, pool)?,
            parallel_product(&a21 + &a22, b11.clone(), r, p, pool)?,
            parallel_product(a11.clone(), &b12 - &b22, r, p, pool)?,
            parallel_product(a22.clone(), &b21 - &b11, r, p, pool)?,
            parallel_product(&a11 + &a12, b22.clone(), r, p, pool)?,
            parallel_product(&a21 - &a11, &b11 + &b12, r, p, pool)?,
            parallel_product(&a12 - &a22, &b21 + &b22, r, p, pool)?,
        )
    };

    recombine(n, h, [&m1, &m2, &m3, &m4, &m5, &m6, &m7])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;

    fn random_square(dim: usize) -> Matrix<i64> {
        let mut m = Matrix::new(dim, dim).unwrap();
        utils::randomize(&mut m, -100, 100);
        m
    }

    #[test]
    fn serial_equals_direct_for_all_depths() {
        let a = random_square(8);
        let b = random_square(8);
        let direct = a.checked_mul(&b).unwrap();

        for r in 0..=3 {
            let product = Strassen::new(a.clone(), b.clone(), r).unwrap().run().unwrap();
            assert_eq!(product, direct, "depth r={}", r);
        }
    }

    #[test]
    fn depth_zero_is_direct_product() {
        let a = random_square(6);
        let b = random_square(6);

        let product = Strassen::new(a.clone(), b.clone(), 0).unwrap().run().unwrap();
        assert_eq!(product, a.checked_mul(&b).unwrap());
    }

    #[test]
    fn odd_dimension_falls_back() {
        let a = random_square(7);
        let b = random_square(7);

        let product = Strassen::new(a.clone(), b.clone(), 3).unwrap().run().unwrap();
        assert_eq!(product, a.checked_mul(&b).unwrap());
    }

    #[test]
    fn even_dimension_with_odd_half_recurses_once() {
        // 6 = 2 * 3：第一层分块后子块为奇数维，在下一层回退
        let a = random_square(6);
        let b = random_square(6);

        let product = Strassen::new(a.clone(), b.clone(), 3).unwrap().run().unwrap();
        assert_eq!(product, a.checked_mul(&b).unwrap());
    }

    #[test]
    fn non_square_operands_rejected() {
        let a = Matrix::<i64>::new(4, 2).unwrap();
        let b = Matrix::<i64>::new(2, 4).unwrap();

        assert!(Strassen::new(a.clone(), b.clone(), 1).is_err());

        let square = Matrix::<i64>::new(4, 4).unwrap();
        assert!(Strassen::new(a, square, 1).is_err());
    }

    #[test]
    fn unequal_square_operands_rejected() {
        let a = Matrix::<i64>::new(4, 4).unwrap();
        let b = Matrix::<i64>::new(2, 2).unwrap();

        assert!(Strassen::new(a, b, 1).is_err());
    }
}
