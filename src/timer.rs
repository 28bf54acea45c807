use std::time::{Duration, Instant};

/// 壁钟计时器
///
/// 供基准驱动程序测量乘法耗时。
#[derive(Debug, Clone)]
pub struct Timer {
    t_start: Instant,
    t_stop: Instant,
}

impl Timer {
    /// 生成计时器，起止时间均为当前时刻
    pub fn new() -> Timer {
        let now = Instant::now();
        Timer {
            t_start: now,
            t_stop: now,
        }
    }

    /// 记录起始时刻
    pub fn start(&mut self) {
        self.t_start = Instant::now();
    }

    /// 记录结束时刻
    pub fn stop(&mut self) {
        self.t_stop = Instant::now();
    }

    /// 最近一次start与stop之间的时长
    pub fn duration(&self) -> Duration {
        self.t_stop.saturating_duration_since(self.t_start)
    }

    /// 以秒为单位的时长
    pub fn seconds(&self) -> f64 {
        self.duration().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Timer {
        Timer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn measures_elapsed_time() {
        let mut timer = Timer::new();

        timer.start();
        thread::sleep(Duration::from_millis(10));
        timer.stop();

        assert!(timer.duration() >= Duration::from_millis(10));
        assert!(timer.seconds() > 0.0);
    }

    #[test]
    fn stop_before_start_is_zero() {
        let mut timer = Timer::new();
        timer.stop();
        timer.start();

        assert_eq!(timer.duration(), Duration::from_secs(0));
    }
}
