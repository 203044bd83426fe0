//! 自适应节拍
//!
//! 信号变化剧烈或按钮按下时，监听窗口立即收缩到 0；信号平稳时逐步放宽，
//! 最长 2 秒。每次迭代都会上报一次，与监听窗口长短无关。

use std::time::Duration;

/// 相邻采样差超过该值时收缩到 0
pub const COLLAPSE_DELTA: u32 = 0x500;
/// 相邻采样差超过该值时加速
pub const SPEED_UP_DELTA: u32 = 0x200;
/// 每次加速/减速的步长（秒）
pub const PAUSE_STEP: f64 = 0.01;
/// 监听窗口上限（秒）
pub const MAX_PAUSE: f64 = 2.0;

/// 单次更新的调整方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceAdjustment {
    /// 监听窗口归零
    Collapse,
    /// 缩短 `PAUSE_STEP`
    SpeedUp,
    /// 放宽 `PAUSE_STEP`
    SlowDown,
}

/// 节拍状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    pause: f64,
    last_sample: u16,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer {
    pub fn new() -> Self {
        Self::with_state(0.0, 0)
    }

    /// 从指定状态开始（`pause` 被钳位到 `[0, 2]`）
    pub fn with_state(pause: f64, last_sample: u16) -> Self {
        Self {
            pause: pause.clamp(0.0, MAX_PAUSE),
            last_sample,
        }
    }

    /// 当前监听窗口（秒）
    pub fn pause(&self) -> f64 {
        self.pause
    }

    pub fn pause_duration(&self) -> Duration {
        Duration::from_secs_f64(self.pause)
    }

    pub fn last_sample(&self) -> u16 {
        self.last_sample
    }

    /// 根据新采样更新监听窗口
    pub fn update(&mut self, sample: u16, button_pressed: bool) -> PaceAdjustment {
        let delta = u32::from(self.last_sample.abs_diff(sample));
        self.last_sample = sample;

        let adjustment = if delta > COLLAPSE_DELTA || button_pressed {
            PaceAdjustment::Collapse
        } else if delta > SPEED_UP_DELTA {
            PaceAdjustment::SpeedUp
        } else {
            PaceAdjustment::SlowDown
        };

        let pause = match adjustment {
            PaceAdjustment::Collapse => 0.0,
            PaceAdjustment::SpeedUp => self.pause - PAUSE_STEP,
            PaceAdjustment::SlowDown => self.pause + PAUSE_STEP,
        };
        self.pause = pause.clamp(0.0, MAX_PAUSE);

        adjustment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_initial_state() {
        let pacer = Pacer::new();
        assert_eq!(pacer.pause(), 0.0);
        assert_eq!(pacer.last_sample(), 0);
        assert_eq!(pacer.pause_duration(), Duration::ZERO);
    }

    #[test]
    fn test_large_delta_collapses() {
        let mut pacer = Pacer::with_state(1.5, 1000);
        assert_eq!(pacer.update(1000 + 0x600, false), PaceAdjustment::Collapse);
        assert_eq!(pacer.pause(), 0.0);
        assert_eq!(pacer.last_sample(), 1000 + 0x600);
    }

    #[test]
    fn test_large_negative_delta_collapses() {
        let mut pacer = Pacer::with_state(1.0, 0x2000);
        assert_eq!(pacer.update(0x2000 - 0x501, false), PaceAdjustment::Collapse);
        assert_eq!(pacer.pause(), 0.0);
    }

    #[test]
    fn test_button_collapses() {
        let mut pacer = Pacer::with_state(1.0, 1000);
        assert_eq!(pacer.update(1000, true), PaceAdjustment::Collapse);
        assert_eq!(pacer.pause(), 0.0);
    }

    #[test]
    fn test_medium_delta_speeds_up() {
        let mut pacer = Pacer::with_state(0.5, 1000);
        assert_eq!(pacer.update(1000 + 0x300, false), PaceAdjustment::SpeedUp);
        assert!(approx_eq(pacer.pause(), 0.49));
    }

    #[test]
    fn test_speed_up_never_below_zero() {
        let mut pacer = Pacer::with_state(0.0, 1000);
        assert_eq!(pacer.update(1000 + 0x300, false), PaceAdjustment::SpeedUp);
        assert_eq!(pacer.pause(), 0.0);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // 恰好等于阈值不触发
        let mut pacer = Pacer::with_state(1.0, 1000);
        assert_eq!(pacer.update(1000 + 0x500, false), PaceAdjustment::SpeedUp);
        assert_eq!(pacer.update(1000 + 0x500 + 0x200, false), PaceAdjustment::SlowDown);
    }

    #[test]
    fn test_stable_signal_reaches_ceiling() {
        let mut pacer = Pacer::with_state(0.0, 1000);
        for _ in 0..250 {
            assert_eq!(pacer.update(1000, false), PaceAdjustment::SlowDown);
        }
        assert_eq!(pacer.pause(), MAX_PAUSE);
        assert_eq!(pacer.pause_duration(), Duration::from_secs(2));

        pacer.update(1000 + 0x100, false);
        assert_eq!(pacer.pause(), MAX_PAUSE);
    }

    #[test]
    fn test_stable_signal_ramp() {
        let mut pacer = Pacer::with_state(0.0, 1000);
        for _ in 0..100 {
            pacer.update(1001, false);
        }
        assert!(approx_eq(pacer.pause(), 1.0));
    }

    proptest! {
        #[test]
        fn pause_stays_in_range(
            start in 0.0f64..=2.0,
            steps in proptest::collection::vec((any::<u16>(), any::<bool>()), 1..300),
        ) {
            let mut pacer = Pacer::with_state(start, 0);
            for (sample, button) in steps {
                pacer.update(sample, button);
                prop_assert!((0.0..=MAX_PAUSE).contains(&pacer.pause()));
                prop_assert_eq!(pacer.last_sample(), sample);
            }
        }
    }
}
