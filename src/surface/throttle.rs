//! Rate- and threshold-gated emission of continuous control values.
//!
//! Each logical stream (one per control quantity, e.g. the source position or one fader
//! channel) remembers the last value it emitted and when. Candidates arriving too soon or
//! too close to the last emitted value are held as pending instead of sent; the newest
//! pending value is force-flushed when the gesture ends so the final state is never lost.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::surface::geometry::Point;

/// How far a candidate has moved from the previously emitted value.
pub trait Magnitude {
    fn change_from(&self, previous: &Self) -> f64;
}

impl Magnitude for Point {
    /// Largest per-axis change, so a move only counts once some axis moved far enough.
    fn change_from(&self, previous: &Self) -> f64 {
        (self.x - previous.x).abs().max((self.y - previous.y).abs())
    }
}

impl Magnitude for u16 {
    fn change_from(&self, previous: &Self) -> f64 {
        f64::from(self.abs_diff(*previous))
    }
}

impl Magnitude for f64 {
    fn change_from(&self, previous: &Self) -> f64 {
        (self - previous).abs()
    }
}

/// Identity of one throttled control stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKey {
    /// Position of the virtual sound source.
    Source,
    /// Level of one fader channel.
    Fader(u32),
}

/// Gating policy shared by every stream of one emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottlePolicy {
    /// Minimum time between two emissions on one stream.
    pub min_interval: Duration,
    /// Minimum change from the last emitted value; `None` gates on time only.
    pub min_delta: Option<f64>,
}

impl ThrottlePolicy {
    pub fn time_only(min_interval: Duration) -> Self {
        Self {
            min_interval,
            min_delta: None,
        }
    }

    pub fn with_min_delta(min_interval: Duration, min_delta: f64) -> Self {
        Self {
            min_interval,
            min_delta: Some(min_delta),
        }
    }
}

#[derive(Debug, Clone)]
struct ThrottleState<V> {
    last_emitted: Option<V>,
    last_emit: Option<Instant>,
    pending: Option<V>,
}

impl<V> Default for ThrottleState<V> {
    fn default() -> Self {
        Self {
            last_emitted: None,
            last_emit: None,
            pending: None,
        }
    }
}

/// Coalesces a high-frequency stream of values into a bounded-rate stream per key.
///
/// The emitter never sends anything itself; every method returns the values the caller
/// must send now, in the order they must be sent.
#[derive(Debug, Clone)]
pub struct ThrottledEmitter<K, V> {
    policy: ThrottlePolicy,
    streams: BTreeMap<K, ThrottleState<V>>,
}

impl<K, V> ThrottledEmitter<K, V>
where
    K: Ord + Clone + Debug,
    V: Magnitude + Clone + Debug,
{
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            streams: BTreeMap::new(),
        }
    }

    fn passes_gate(
        policy: &ThrottlePolicy,
        state: &ThrottleState<V>,
        value: &V,
        now: Instant,
    ) -> bool {
        let Some(last_emit) = state.last_emit else {
            return true;
        };

        if now.saturating_duration_since(last_emit) < policy.min_interval {
            return false;
        }

        match (policy.min_delta, &state.last_emitted) {
            (Some(min_delta), Some(previous)) => value.change_from(previous) >= min_delta,
            _ => true,
        }
    }

    fn mark_emitted(state: &mut ThrottleState<V>, value: &V, now: Instant) {
        state.last_emitted = Some(value.clone());
        state.last_emit = Some(now);
        state.pending = None;
    }

    /// Offers a new candidate on stream `key`.
    ///
    /// # Returns
    ///
    /// - `Some(value)`: the candidate passed the gate and must be sent now
    /// - `None`: the candidate was held as the stream's pending value
    pub fn offer(&mut self, key: K, value: V, now: Instant) -> Option<V> {
        let state = self.streams.entry(key.clone()).or_default();

        if Self::passes_gate(&self.policy, state, &value, now) {
            Self::mark_emitted(state, &value, now);
            return Some(value);
        }

        log::trace!("Throttled {key:?} => {value:?}");
        state.pending = Some(value);
        None
    }

    /// Emits the pending value of `key` unconditionally, if there is one.
    pub fn flush(&mut self, key: &K, now: Instant) -> Option<V> {
        let state = self.streams.get_mut(key)?;
        let value = state.pending.take()?;
        Self::mark_emitted(state, &value, now);
        Some(value)
    }

    /// Emits the pending value of every stream unconditionally.
    pub fn flush_all(&mut self, now: Instant) -> Vec<(K, V)> {
        let mut out = Vec::new();
        for (key, state) in &mut self.streams {
            if let Some(value) = state.pending.take() {
                Self::mark_emitted(state, &value, now);
                out.push((key.clone(), value));
            }
        }
        out
    }

    /// Emits pending values that would pass the gate at `now`.
    ///
    /// Driven from the host's frame loop so a stream whose source stopped changing still
    /// converges before the gesture ends.
    pub fn poll_due(&mut self, now: Instant) -> Vec<(K, V)> {
        let policy = self.policy;
        let mut out = Vec::new();
        for (key, state) in &mut self.streams {
            let due = match &state.pending {
                Some(value) => Self::passes_gate(&policy, state, value, now),
                None => false,
            };
            if !due {
                continue;
            }
            if let Some(value) = state.pending.take() {
                Self::mark_emitted(state, &value, now);
                out.push((key.clone(), value));
            }
        }
        out
    }

    pub fn pending(&self, key: &K) -> Option<&V> {
        self.streams.get(key).and_then(|s| s.pending.as_ref())
    }

    pub fn last_emitted(&self, key: &K) -> Option<&V> {
        self.streams.get(key).and_then(|s| s.last_emitted.as_ref())
    }

    pub fn has_pending(&self) -> bool {
        self.streams.values().any(|s| s.pending.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_value_is_emitted_immediately() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(50)));
        let t0 = Instant::now();

        assert_eq!(emitter.offer(0u32, 10u16, t0), Some(10));
        assert_eq!(emitter.last_emitted(&0), Some(&10));
        assert_eq!(emitter.pending(&0), None);
    }

    #[test]
    fn test_burst_is_bounded_and_final_value_flushed() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(50)));
        let t0 = Instant::now();
        let mut emitted = Vec::new();

        // 100 candidates spread over 49.5ms.
        for i in 0..100u64 {
            let now = t0 + Duration::from_micros(i * 500);
            if let Some(v) = emitter.offer((), i as f64, now) {
                emitted.push(v);
            }
        }
        if let Some(v) = emitter.flush(&(), t0 + ms(50)) {
            emitted.push(v);
        }

        assert!(emitted.len() <= 2);
        assert_eq!(emitted.last(), Some(&99.0));
    }

    #[test]
    fn test_interval_elapsed_emits_again() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(50)));
        let t0 = Instant::now();

        assert_eq!(emitter.offer((), 1.0, t0), Some(1.0));
        assert_eq!(emitter.offer((), 2.0, t0 + ms(10)), None);
        assert_eq!(emitter.offer((), 3.0, t0 + ms(50)), Some(3.0));
        // The older pending value was superseded, nothing left to flush.
        assert_eq!(emitter.flush(&(), t0 + ms(51)), None);
    }

    #[test]
    fn test_magnitude_gate() {
        let policy = ThrottlePolicy::with_min_delta(ms(50), 0.1);
        let mut emitter = ThrottledEmitter::new(policy);
        let t0 = Instant::now();

        assert!(emitter.offer((), Point::new(1.0, 1.0), t0).is_some());
        // Enough time, too little movement on both axes.
        assert_eq!(emitter.offer((), Point::new(1.05, 0.95), t0 + ms(100)), None);
        // One axis moved far enough.
        assert_eq!(
            emitter.offer((), Point::new(1.0, 1.2), t0 + ms(200)),
            Some(Point::new(1.0, 1.2))
        );
    }

    #[test]
    fn test_flush_ignores_gate() {
        let policy = ThrottlePolicy::with_min_delta(ms(50), 10.0);
        let mut emitter = ThrottledEmitter::new(policy);
        let t0 = Instant::now();

        emitter.offer((), 0.0, t0);
        assert_eq!(emitter.offer((), 0.5, t0 + ms(1)), None);
        assert_eq!(emitter.flush(&(), t0 + ms(2)), Some(0.5));
        assert_eq!(emitter.last_emitted(&()), Some(&0.5));
        assert_eq!(emitter.flush(&(), t0 + ms(3)), None);
    }

    #[test]
    fn test_streams_are_independent() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(50)));
        let t0 = Instant::now();

        assert_eq!(emitter.offer(16u32, 100u16, t0), Some(100));
        assert_eq!(emitter.offer(17u32, 200u16, t0), Some(200));
        assert_eq!(emitter.offer(16u32, 110u16, t0 + ms(5)), None);
        assert_eq!(emitter.offer(17u32, 210u16, t0 + ms(5)), None);

        let flushed = emitter.flush_all(t0 + ms(6));
        assert_eq!(flushed, vec![(16, 110), (17, 210)]);
        assert!(!emitter.has_pending());
    }

    #[test]
    fn test_poll_due_emits_trailing_value() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(50)));
        let t0 = Instant::now();

        emitter.offer((), 1.0, t0);
        emitter.offer((), 2.0, t0 + ms(10));

        assert!(emitter.poll_due(t0 + ms(20)).is_empty());
        assert_eq!(emitter.poll_due(t0 + ms(60)), vec![((), 2.0)]);
        assert!(emitter.poll_due(t0 + ms(200)).is_empty());
    }

    #[test]
    fn test_emissions_preserve_observation_order() {
        let mut emitter = ThrottledEmitter::new(ThrottlePolicy::time_only(ms(10)));
        let t0 = Instant::now();
        let mut emitted = Vec::new();

        for i in 0..50u64 {
            if let Some(v) = emitter.offer((), i as f64, t0 + ms(i * 3)) {
                emitted.push(v);
            }
        }
        emitted.extend(emitter.flush(&(), t0 + ms(200)));

        assert!(emitted.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(emitted.last(), Some(&49.0));
    }
}
