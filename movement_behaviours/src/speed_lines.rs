//! Speed-line overlay intensity: 0 at or below the minimum speed, 1 at the
//! maximum, exponentially smoothed so dashes ramp the effect in and out
//! instead of snapping.

use locomotion_core::config::SpeedLinesConfig;
use rapier3d::prelude::Real;

pub struct SpeedLines {
    cfg: SpeedLinesConfig,
    intensity: Real,
}

impl SpeedLines {
    pub fn new(cfg: SpeedLinesConfig) -> Self {
        Self { cfg, intensity: 0.0 }
    }

    /// Current overlay intensity in 0..1 for the host renderer.
    pub fn intensity(&self) -> Real {
        self.intensity
    }

    pub fn update(&mut self, speed: Real, dt: Real) {
        let span = (self.cfg.max_speed - self.cfg.min_speed).max(1.0e-3);
        let target = ((speed - self.cfg.min_speed) / span).clamp(0.0, 1.0);
        let blend = if self.cfg.smoothing > 0.0 {
            (dt / self.cfg.smoothing).min(1.0)
        } else {
            1.0
        };
        self.intensity += (target - self.intensity) * blend;
    }

    pub fn reset(&mut self) {
        self.intensity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_speed_stays_dark_and_fast_speed_saturates() {
        let cfg = SpeedLinesConfig::default();
        let mut lines = SpeedLines::new(cfg);
        for _ in 0..100 {
            lines.update(cfg.min_speed - 1.0, 1.0 / 60.0);
        }
        assert_eq!(lines.intensity(), 0.0);

        for _ in 0..200 {
            lines.update(cfg.max_speed + 5.0, 1.0 / 60.0);
        }
        assert!(lines.intensity() > 0.99);
    }

    #[test]
    fn intensity_ramps_rather_than_snaps() {
        let cfg = SpeedLinesConfig::default();
        let mut lines = SpeedLines::new(cfg);
        lines.update(cfg.max_speed, 1.0 / 60.0);
        assert!(lines.intensity() > 0.0 && lines.intensity() < 0.5);
    }

    #[test]
    fn midpoint_speed_settles_near_half() {
        let cfg = SpeedLinesConfig::default();
        let mut lines = SpeedLines::new(cfg);
        let mid = (cfg.min_speed + cfg.max_speed) * 0.5;
        for _ in 0..300 {
            lines.update(mid, 1.0 / 60.0);
        }
        assert!((lines.intensity() - 0.5).abs() < 0.01);
    }
}
