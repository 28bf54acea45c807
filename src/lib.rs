#![deny(missing_docs)]
//! 一个通过任务线程池并行化Strassen分治算法的矩阵乘法库。

pub use error::{MatError, Result};
pub use matrix::{Matrix, Scalar};
pub use strassen::{ParallelStrassen, Strassen};
pub use task_pool::{QueueEnd, TaskFuture, TaskPool};
pub use timer::Timer;

#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_term;

mod error;
mod matrix;
mod strassen;
mod timer;
pub mod algebra;
pub mod task_pool;
pub mod utils;
