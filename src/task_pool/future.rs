use crate::{MatError, Result};
use crossbeam_channel::{bounded, Receiver};
use slog::Logger;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// 队列中持有的类型擦除任务
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// 与单个任务1:1配对的future
///
/// 任务执行后结果经由容量为1的通道写入，恰好写一次；
/// `wait`消耗self，恰好读一次。
pub struct TaskFuture<R> {
    receiver: Receiver<Result<R>>,
}

impl<R> TaskFuture<R> {
    /// 阻塞等待任务结果
    ///
    /// # Errors
    ///
    /// 任务panic时返回`MatError::TaskPanic`；
    /// 任务尚未执行就随线程池销毁被丢弃时返回`MatError::TaskAbandoned`。
    pub fn wait(self) -> Result<R> {
        match self.receiver.recv() {
            Ok(result) => result,
            // 发送端随任务一起被丢弃
            Err(_) => Err(MatError::TaskAbandoned),
        }
    }
}

/// 把闭包打包为任务与future对
///
/// panic在任务内部被捕获并转为错误，不会传出工作线程循环。
pub(crate) fn package<F, R>(work: F, logger: Logger) -> (Job, TaskFuture<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (sender, receiver) = bounded(1);

    let job = Box::new(move || {
        let result = catch_unwind(AssertUnwindSafe(work)).map_err(|err| {
            let msg = panic_message(err);
            error!(logger, "Task panicked: {}", msg);
            MatError::TaskPanic(msg)
        });

        // 提交方可能已放弃future，发送失败无需处理
        let _ = sender.send(result);
    });

    (job, TaskFuture { receiver })
}

fn panic_message(err: Box<dyn Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
