use failure::Fail;
use std::io;

/// strassen 错误类型.
#[derive(Debug, Fail)]
pub enum MatError {
    /// IO 错误.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    /// 序列化与反序列化错误.
    #[fail(display = "{}", _0)]
    Serde(#[cause] serde_json::Error),
    /// 维度不匹配.
    #[fail(display = "Dimension mismatch: {}", _0)]
    Dimension(String),
    /// 矩阵不可逆.
    #[fail(display = "Matrix is singular")]
    Singular,
    /// 任务执行过程中panic.
    #[fail(display = "Task panicked: {}", _0)]
    TaskPanic(String),
    /// 任务在执行前被线程池丢弃.
    #[fail(display = "Task abandoned by pool shutdown")]
    TaskAbandoned,
    /// 带有错误信息的一般错误.
    #[fail(display = "{}", _0)]
    StringError(String),
}

impl From<io::Error> for MatError {
    fn from(err: io::Error) -> MatError {
        MatError::Io(err)
    }
}

impl From<serde_json::Error> for MatError {
    fn from(err: serde_json::Error) -> MatError {
        MatError::Serde(err)
    }
}

/// strassen中的Result类型
pub type Result<T> = std::result::Result<T, MatError>;
