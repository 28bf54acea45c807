use clap::{Parser, ValueEnum};
use slog::{info, o, Drain, Logger};
use std::process::exit;
use strassen::{utils, MatError, Matrix, ParallelStrassen, QueueEnd, Result, Strassen, TaskPool, Timer};

#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        author = env!("CARGO_PKG_AUTHORS"),
        about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// 方阵维度
    #[arg(long, default_value_t = 512)]
    dim: usize,

    /// 工作线程数量，默认为逻辑核数
    #[arg(long)]
    threads: Option<usize>,

    /// Strassen递归深度r
    #[arg(short, long, default_value_t = 4)]
    recursion_depth: usize,

    /// 并行派发深度p
    #[arg(short, long, default_value_t = 1)]
    parallel_depth: usize,

    /// 工作线程取任务的队列端
    #[arg(long, value_enum, default_value = "front")]
    queue_end: End,

    /// 队列为空时工作线程的休眠毫秒数
    #[arg(long, default_value_t = 2)]
    poll_ms: u64,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum End {
    /// 取队首（LIFO）
    Front,
    /// 取队尾（FIFO）
    Back,
}

impl From<End> for QueueEnd {
    fn from(end: End) -> QueueEnd {
        match end {
            End::Front => QueueEnd::Front,
            End::Back => QueueEnd::Back,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let logger = Logger::root(drain, o!("dim" => cli.dim));

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    let pool = TaskPool::with_logger(
        threads,
        cli.queue_end.into(),
        cli.poll_ms,
        logger.clone(),
    )?;

    info!(logger, "Generating operands";
        "threads" => threads,
        "r" => cli.recursion_depth,
        "p" => cli.parallel_depth);

    let mut m = Matrix::<f64>::new(cli.dim, cli.dim)?;
    let mut n = Matrix::<f64>::new(cli.dim, cli.dim)?;
    utils::randomize(&mut m, -1.0, 1.0);
    utils::randomize(&mut n, -1.0, 1.0);

    let mut timer = Timer::new();

    timer.start();
    let direct = m.checked_mul(&n)?;
    timer.stop();
    info!(logger, "Direct multiplication done"; "seconds" => timer.seconds());

    timer.start();
    let serial = Strassen::new(m.clone(), n.clone(), cli.recursion_depth)?.run()?;
    timer.stop();
    info!(logger, "Serial Strassen done"; "seconds" => timer.seconds());

    timer.start();
    let parallel = ParallelStrassen::new(
        m,
        n,
        cli.recursion_depth,
        cli.parallel_depth,
        &pool,
    )?
    .run()?;
    timer.stop();
    info!(logger, "Parallel Strassen done"; "seconds" => timer.seconds());

    verify(&direct, &serial, "serial")?;
    verify(&direct, &parallel, "parallel")?;
    info!(logger, "All products agree");

    Ok(())
}

/// 浮点运算顺序不同导致的微小偏差在容差内视为一致
fn verify(expected: &Matrix<f64>, actual: &Matrix<f64>, name: &str) -> Result<()> {
    for i in 0..expected.rows() {
        for j in 0..expected.columns() {
            let diff = (expected[(i, j)] - actual[(i, j)]).abs();
            if diff > 1e-6 {
                return Err(MatError::StringError(format!(
                    "{} product differs from direct product at ({}, {}) by {}",
                    name, i, j, diff
                )));
            }
        }
    }
    Ok(())
}
