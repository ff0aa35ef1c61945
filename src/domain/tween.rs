/// Serialized animation queue.
///
/// A `Tween` interpolates one Vec3 property over a fixed tick count. A
/// `TweenChain` is one logical queued unit of consecutive phases (rotation
/// tilts into the turn, then settles back to neutral, as a single unit).
/// The `TweenQueue` serializes chains FIFO: only the front chain advances,
/// completion dequeues it and the next starts on the following tick —
/// at most one animation in flight, strict input-order preservation.
///
/// Behind the in-flight chain at most `QUEUE_CAP` chains wait; excess
/// pushes are silently dropped rather than growing unbounded under rapid
/// input.

use std::collections::VecDeque;

use glam::Vec3;

pub const QUEUE_CAP: usize = 2;

/// Ease-out cubic, the snap-then-settle feel of a lane change.
fn ease_out(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

#[derive(Clone, Copy, Debug)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    total: u32,
    elapsed: u32,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, total_ticks: u32) -> Self {
        Tween { from, to, total: total_ticks.max(1), elapsed: 0 }
    }

    fn tick(&mut self) -> Vec3 {
        self.elapsed = (self.elapsed + 1).min(self.total);
        self.sample()
    }

    fn sample(&self) -> Vec3 {
        let t = self.elapsed as f32 / self.total as f32;
        self.from.lerp(self.to, ease_out(t))
    }

    fn done(&self) -> bool {
        self.elapsed >= self.total
    }

    pub fn end(&self) -> Vec3 {
        self.to
    }
}

/// One queued unit: consecutive tween phases played back to back.
#[derive(Clone, Debug)]
pub struct TweenChain {
    phases: Vec<Tween>,
    current: usize,
}

impl TweenChain {
    pub fn single(tween: Tween) -> Self {
        TweenChain { phases: vec![tween], current: 0 }
    }

    /// Two-phase chain: out to `mid`, then back to `end`.
    pub fn two_phase(from: Vec3, mid: Vec3, end: Vec3, phase_ticks: u32) -> Self {
        TweenChain {
            phases: vec![
                Tween::new(from, mid, phase_ticks),
                Tween::new(mid, end, phase_ticks),
            ],
            current: 0,
        }
    }

    fn tick(&mut self) -> Vec3 {
        let value = self.phases[self.current].tick();
        if self.phases[self.current].done() && self.current + 1 < self.phases.len() {
            self.current += 1;
        }
        value
    }

    fn done(&self) -> bool {
        self.current + 1 >= self.phases.len() && self.phases[self.current].done()
    }

    /// Final resting value of the whole chain.
    pub fn end(&self) -> Vec3 {
        self.phases[self.phases.len() - 1].end()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TweenQueue {
    active: Option<TweenChain>,
    waiting: VecDeque<TweenChain>,
}

impl TweenQueue {
    pub fn new() -> Self {
        TweenQueue {
            active: None,
            waiting: VecDeque::with_capacity(QUEUE_CAP),
        }
    }

    /// Enqueue a chain. If nothing is in flight it starts immediately;
    /// otherwise it waits behind every earlier chain. Returns false (input
    /// dropped) when the waiting line is at capacity.
    pub fn push(&mut self, chain: TweenChain) -> bool {
        if self.active.is_none() {
            self.active = Some(chain);
            return true;
        }
        if self.waiting.len() >= QUEUE_CAP {
            return false;
        }
        self.waiting.push_back(chain);
        true
    }

    /// Advance the in-flight chain by one tick. Returns the sampled value,
    /// or `None` when idle. Completion dequeues; draining is pull-based —
    /// the next chain starts on the next tick.
    pub fn tick(&mut self) -> Option<Vec3> {
        let chain = self.active.as_mut()?;
        let value = chain.tick();
        if chain.done() {
            self.active = self.waiting.pop_front();
        }
        Some(value)
    }

    /// Final resting value of the last queued chain, if any. This is the
    /// position a follow-up move must chain from.
    pub fn pending_end(&self) -> Option<Vec3> {
        self.waiting.back().or(self.active.as_ref()).map(|c| c.end())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.active.is_some()) + self.waiting.len()
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.waiting.clear();
    }
}
