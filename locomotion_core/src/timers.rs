//! Purpose-keyed countdown timers.
//!
//! All deferred work in the engine (dash regeneration, cooldown gates, the
//! ground-leave re-check) goes through one of these pools instead of ad hoc
//! per-behaviour countdown fields. Starting a timer under a key that is
//! already running cancels the prior timer first; cancellation is always
//! explicit at the call site.

use std::fmt::Debug;

use rapier3d::prelude::Real;

/// Timer purposes used across the locomotion behaviours. One logical timer
/// per key; behaviours gate on `is_running` and react to fired keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKey {
    JumpCooldown,
    DashRegen,
    GroundRecheck,
    LandCooldown,
    GrappleCooldown,
    SlideDuration,
    WallRunCountdown,
}

pub struct TimerPool<K: Copy + Eq + Debug> {
    active: Vec<(K, Real)>,
}

impl<K: Copy + Eq + Debug> Default for TimerPool<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Debug> TimerPool<K> {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Starts (or restarts) the timer under `key`. A timer already running
    /// under the same key is canceled first.
    pub fn start(&mut self, key: K, duration: Real) {
        let duration = duration.max(0.0);
        if let Some(entry) = self.active.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = duration;
        } else {
            self.active.push((key, duration));
        }
    }

    /// Cancels the timer under `key` if one is running. Returns whether a
    /// timer was actually canceled.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.active.len();
        self.active.retain(|(k, _)| *k != key);
        self.active.len() != before
    }

    pub fn is_running(&self, key: K) -> bool {
        self.active.iter().any(|(k, _)| *k == key)
    }

    pub fn remaining(&self, key: K) -> Option<Real> {
        self.active
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| *t)
    }

    /// Advances every running timer by `dt` and returns the keys that fired
    /// this tick, in start order.
    pub fn advance(&mut self, dt: Real) -> Vec<K> {
        let dt = dt.max(0.0);
        let mut fired = Vec::new();
        for (key, remaining) in &mut self.active {
            *remaining -= dt;
            if *remaining <= 0.0 {
                fired.push(*key);
            }
        }
        self.active.retain(|(_, t)| *t > 0.0);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_duration_elapses() {
        let mut pool = TimerPool::new();
        pool.start(TimerKey::DashRegen, 0.5);
        assert!(pool.advance(0.3).is_empty());
        assert!(pool.is_running(TimerKey::DashRegen));
        let fired = pool.advance(0.25);
        assert_eq!(fired, vec![TimerKey::DashRegen]);
        assert!(!pool.is_running(TimerKey::DashRegen));
    }

    #[test]
    fn restart_replaces_prior_timer() {
        let mut pool = TimerPool::new();
        pool.start(TimerKey::GroundRecheck, 0.1);
        pool.advance(0.05);
        pool.start(TimerKey::GroundRecheck, 0.1);
        assert!(pool.advance(0.06).is_empty());
        let fired = pool.advance(0.05);
        assert_eq!(fired, vec![TimerKey::GroundRecheck]);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut pool = TimerPool::new();
        pool.start(TimerKey::GrappleCooldown, 0.2);
        assert!(pool.cancel(TimerKey::GrappleCooldown));
        assert!(!pool.cancel(TimerKey::GrappleCooldown));
        assert!(pool.advance(1.0).is_empty());
    }

    #[test]
    fn independent_keys_fire_independently() {
        let mut pool = TimerPool::new();
        pool.start(TimerKey::JumpCooldown, 0.1);
        pool.start(TimerKey::LandCooldown, 0.3);
        assert_eq!(pool.advance(0.15), vec![TimerKey::JumpCooldown]);
        assert_eq!(pool.advance(0.2), vec![TimerKey::LandCooldown]);
    }
}
