//! 该模块提供矩阵的随机填充、近零归零与文件存取工具

use crate::matrix::{Matrix, Scalar};
use crate::Result;
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::ops::Neg;
use std::path::Path;

/// 用`[min, max)`上的均匀分布随机数填充矩阵
pub fn randomize<T>(m: &mut Matrix<T>, min: T, max: T)
where
    T: Scalar + SampleUniform + PartialOrd,
{
    let mut rng = rand::thread_rng();

    for i in 0..m.rows() {
        for j in 0..m.columns() {
            m[(i, j)] = rng.gen_range(min, max);
        }
    }
}

/// 把绝对值小于epsilon的元素归零
///
/// 用于清理消元等运算留下的浮点噪声。
pub fn round_values<T>(m: &mut Matrix<T>, epsilon: T)
where
    T: Scalar + PartialOrd + Neg<Output = T>,
{
    for i in 0..m.rows() {
        for j in 0..m.columns() {
            let value = m[(i, j)];
            if value > -epsilon && value < epsilon {
                m[(i, j)] = T::default();
            }
        }
    }
}

/// 把矩阵以JSON格式写入文件
///
/// # Errors
///
/// 文件创建或序列化失败时返回错误
pub fn save<T>(m: &Matrix<T>, path: impl AsRef<Path>) -> Result<()>
where
    T: Scalar + Serialize,
{
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, m)?;
    Ok(())
}

/// 从JSON文件读取矩阵
///
/// # Errors
///
/// 文件打开、反序列化失败或数据违反矩阵不变式时返回错误
pub fn load<T>(path: impl AsRef<Path>) -> Result<Matrix<T>>
where
    T: Scalar + DeserializeOwned,
{
    let reader = BufReader::new(File::open(path)?);
    let m = serde_json::from_reader(reader)?;
    Ok(m)
}
