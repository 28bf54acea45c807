//! 该模块提供基于双端队列的任务线程池
//!
//! 工作线程数量在构造时固定，所有工作线程按统一策略
//! 从队列的同一端取任务：取队首为LIFO，取队尾为FIFO。
//! 队列为空时工作线程按轮询间隔休眠后重试，不使用条件变量。
//! 每个提交的任务返回一个[`TaskFuture`]，结果或错误经由它送回提交方。

use crate::{MatError, Result};
use slog::{Discard, Logger};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

mod future;

pub use future::TaskFuture;

use future::Job;

/// 工作线程从队列哪一端取任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEnd {
    /// 取队首，单线程时表现为LIFO
    Front,
    /// 取队尾，单线程时表现为FIFO
    Back,
}

/// 提交与取出共用同一把锁保护的共享状态
struct Shared {
    tasks: VecDeque<Job>,
    work_end: QueueEnd,
    poll_interval: Duration,
}

/// 任务线程池
///
/// 析构时设置关闭标志并join所有工作线程，
/// 仍在队列中的任务被丢弃，其future解析为`TaskAbandoned`。
pub struct TaskPool {
    shared: Arc<Mutex<Shared>>,
    done: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
    logger: Logger,
}

impl TaskPool {
    /// 创建线程池并立即启动全部工作线程
    ///
    /// # 参数
    /// * `threads`: 工作线程数量，之后不可变更
    /// * `work_end`: 工作线程取任务的队列端
    /// * `poll_interval_ms`: 队列为空时的休眠毫秒数
    ///
    /// # Errors
    ///
    /// `threads`为0或线程创建失败时返回错误；
    /// 创建失败时已启动的线程会观察到关闭标志并退出。
    pub fn new(threads: usize, work_end: QueueEnd, poll_interval_ms: u64) -> Result<TaskPool> {
        TaskPool::with_logger(threads, work_end, poll_interval_ms, Logger::root(Discard, o!()))
    }

    /// 同[`TaskPool::new`]，但使用给定logger记录工作线程事件
    pub fn with_logger(
        threads: usize,
        work_end: QueueEnd,
        poll_interval_ms: u64,
        logger: Logger,
    ) -> Result<TaskPool> {
        if threads == 0 {
            return Err(MatError::StringError(
                "Argument 'threads' must be positive".to_string(),
            ));
        }

        let shared = Arc::new(Mutex::new(Shared {
            tasks: VecDeque::new(),
            work_end,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }));
        let done = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(threads);

        for id in 0..threads {
            let shared = Arc::clone(&shared);
            let worker_done = Arc::clone(&done);
            let worker_logger = logger.new(o!("worker" => id));

            match thread::Builder::new().spawn(move || run_tasks(shared, worker_done, worker_logger)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // 已启动的线程在下一次轮询时退出
                    done.store(true, Ordering::Release);
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(TaskPool {
            shared,
            done,
            workers,
            logger,
        })
    }

    /// 把任务加入队首，返回与其配对的future
    ///
    /// 提交只在锁的临界区内短暂阻塞，不等待工作线程空闲。
    pub fn submit_front<F, R>(&self, work: F) -> TaskFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(QueueEnd::Front, work)
    }

    /// 把任务加入队尾，返回与其配对的future
    pub fn submit_back<F, R>(&self, work: F) -> TaskFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(QueueEnd::Back, work)
    }

    /// 队列当前是否为空
    ///
    /// 仅供参考：返回后队列状态随时可能被并发提交改变。
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// 变更工作线程取任务的队列端，对后续轮询生效
    pub fn set_work_end(&self, work_end: QueueEnd) {
        self.lock().work_end = work_end;
    }

    /// 变更队列为空时的休眠毫秒数，对后续轮询生效
    pub fn set_poll_interval(&self, poll_interval_ms: u64) {
        self.lock().poll_interval = Duration::from_millis(poll_interval_ms);
    }

    fn submit<F, R>(&self, end: QueueEnd, work: F) -> TaskFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (job, future) = future::package(work, self.logger.clone());

        let mut shared = self.lock();
        match end {
            QueueEnd::Front => shared.tasks.push_front(job),
            QueueEnd::Back => shared.tasks.push_back(job),
        }

        future
    }

    fn initiate_shutdown(&self) {
        self.done.store(true, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<Shared> {
        // 任务在锁外执行，队列操作自身不会panic，
        // 毒化后直接取回内部数据即可
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.initiate_shutdown();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!(self.logger, "Worker thread panicked");
            }
        }

        // 丢弃未执行的任务，其future随即解析为TaskAbandoned
        self.lock().tasks.clear();
    }
}

/// 工作线程循环：取任务则执行，队列为空则休眠后重试
///
/// 在执行任务前释放队列锁；panic已在任务内部捕获，循环不会中断。
fn run_tasks(shared: Arc<Mutex<Shared>>, done: Arc<AtomicBool>, logger: Logger) {
    debug!(logger, "Worker started");

    while !done.load(Ordering::Acquire) {
        let (job, poll_interval) = {
            let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());

            let job = match shared.work_end {
                QueueEnd::Front => shared.tasks.pop_front(),
                QueueEnd::Back => shared.tasks.pop_back(),
            };

            (job, shared.poll_interval)
        };

        match job {
            Some(job) => job(),
            None => thread::sleep(poll_interval),
        }
    }

    debug!(logger, "Worker exiting");
}
