use std::marker::PhantomData;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use glam::Vec4;

use crate::particle::{FoamParticle, ParticleBuffer};

/// Shared slot counters for the foam pipeline.
///
/// - `consume`: number of particles in the stable buffer. Emission pushes
///   onto it, advection pops from it, and the renderer reads it as the
///   instance count.
/// - `produce`: append cursor into the advection output buffer.
///
/// Both may run past the buffer capacity; every fetch still returns a
/// distinct value and callers discard out-of-range slots. The forward
/// cursors saturate at `i32::MAX` instead of wrapping. Anything that moves a
/// cursor backwards takes `&mut self` (or runs inside a stage that holds the
/// block exclusively), so a slot handed out to a live [`AppendTarget`] is
/// never handed out again.
#[derive(Debug, Default)]
pub struct AtomicCounterBlock {
    consume: AtomicI32,
    produce: AtomicI32,
}

impl AtomicCounterBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next slot on the consume side (push). Returns the slot, or
    /// `i32::MAX` once the counter is saturated.
    #[inline]
    pub fn push_consume(&self) -> i32 {
        saturating_increment(&self.consume)
    }

    /// Pop one index from the consume side. Returns the post-decrement
    /// value, which is negative once the stack is exhausted.
    ///
    /// Only called by advection, which holds the block exclusively while no
    /// consume-side [`AppendTarget`] can exist.
    #[inline]
    pub(crate) fn pop_consume(&self) -> i32 {
        self.consume.fetch_sub(1, Ordering::Relaxed) - 1
    }

    /// Claim the next slot on the produce side. Returns the slot, or
    /// `i32::MAX` once the counter is saturated.
    #[inline]
    pub fn reserve_produce(&self) -> i32 {
        saturating_increment(&self.produce)
    }

    pub fn consume(&self) -> i32 {
        self.consume.load(Ordering::Acquire)
    }

    pub fn produce(&self) -> i32 {
        self.produce.load(Ordering::Acquire)
    }

    /// Clamp the consume count into `[0, capacity]`.
    ///
    /// Runs single-threaded between emission and advection so overflowed
    /// emission requests do not shift valid particles out of the pop range.
    pub fn clamp_consume(&mut self, capacity: usize) {
        let cap = capacity.min(i32::MAX as usize) as i32;
        let value = self.consume.get_mut();
        *value = (*value).clamp(0, cap);
    }

    /// Leader step after compaction: the produced count becomes the next
    /// cycle's consume budget and the produce cursor restarts at zero.
    pub fn swap_for_next_cycle(&mut self) {
        let produced = std::mem::take(self.produce.get_mut());
        *self.consume.get_mut() = produced.max(0);
    }

    /// Alive particles in the stable buffer, bounded by `capacity`.
    pub fn alive_count(&self, capacity: usize) -> usize {
        (self.consume().max(0) as usize).min(capacity)
    }

    pub fn reset(&mut self) {
        *self.consume.get_mut() = 0;
        *self.produce.get_mut() = 0;
    }
}

/// `fetch_add(1)` that sticks at `i32::MAX`. Returns the previous value, or
/// `i32::MAX` if the counter was already saturated.
#[inline]
fn saturating_increment(counter: &AtomicI32) -> i32 {
    match counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1)) {
        Ok(previous) | Err(previous) => previous,
    }
}

/// Which counter an [`AppendTarget`] reserves slots from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendCursor {
    Consume,
    Produce,
}

/// Lock-free appender into a [`ParticleBuffer`].
///
/// Holds the buffer exclusively for its lifetime, so the only writers are
/// calls to [`push`](Self::push). Each call takes a distinct slot from the
/// atomic counter, which makes concurrent pushes race-free.
///
/// The counter block stays borrowed while the target lives, so it cannot be
/// rewound underneath it:
///
/// ```compile_fail
/// use foam_core::counters::{AppendCursor, AppendTarget, AtomicCounterBlock};
/// use foam_core::particle::{FoamParticle, ParticleBuffer};
///
/// let mut buffer = ParticleBuffer::new(4);
/// let mut counters = AtomicCounterBlock::new();
/// let target = AppendTarget::new(&mut buffer, &counters, AppendCursor::Produce);
/// target.push(FoamParticle::default());
/// counters.reset();
/// target.push(FoamParticle::default());
/// ```
///
/// and the consume side cannot be popped from outside the pipeline:
///
/// ```compile_fail
/// use foam_core::counters::AtomicCounterBlock;
///
/// let counters = AtomicCounterBlock::new();
/// counters.pop_consume();
/// ```
pub struct AppendTarget<'a> {
    positions: *mut Vec4,
    velocities: *mut Vec4,
    colors: *mut Vec4,
    attributes: *mut Vec4,
    capacity: usize,
    counters: &'a AtomicCounterBlock,
    cursor: AppendCursor,
    _buffer: PhantomData<&'a mut ParticleBuffer>,
}

// SAFETY: writes go through slots handed out by an atomic increment that
// never wraps, and the counter block is borrowed for 'a so nothing can
// rewind it (rewinding needs `&mut` or the crate-private pop). No two
// threads ever touch the same element, and the buffer is mutably borrowed
// for 'a.
unsafe impl Send for AppendTarget<'_> {}
unsafe impl Sync for AppendTarget<'_> {}

impl<'a> AppendTarget<'a> {
    pub fn new(
        buffer: &'a mut ParticleBuffer,
        counters: &'a AtomicCounterBlock,
        cursor: AppendCursor,
    ) -> Self {
        Self {
            positions: buffer.positions.as_mut_ptr(),
            velocities: buffer.velocities.as_mut_ptr(),
            colors: buffer.colors.as_mut_ptr(),
            attributes: buffer.attributes.as_mut_ptr(),
            capacity: buffer.capacity(),
            counters,
            cursor,
            _buffer: PhantomData,
        }
    }

    /// Reserve a slot and claim it. Returns `Some(slot)` if it is writable,
    /// `None` if the counter has run past capacity.
    #[inline]
    pub fn reserve(&self) -> Option<Slot<'_, 'a>> {
        let slot = match self.cursor {
            AppendCursor::Consume => self.counters.push_consume(),
            AppendCursor::Produce => self.counters.reserve_produce(),
        };
        // i32::MAX only comes back from a saturated counter
        if slot < 0 || slot == i32::MAX || slot as usize >= self.capacity {
            return None;
        }
        Some(Slot {
            target: self,
            index: slot as usize,
        })
    }

    /// Reserve a slot and write `particle` into it. Returns the slot, or
    /// `None` if it was out of range and the particle was dropped.
    #[inline]
    pub fn push(&self, particle: FoamParticle) -> Option<usize> {
        self.reserve().map(|slot| slot.write(particle))
    }
}

/// An exclusively claimed, in-range slot of an [`AppendTarget`].
pub struct Slot<'t, 'a> {
    target: &'t AppendTarget<'a>,
    index: usize,
}

impl Slot<'_, '_> {
    pub fn write(self, particle: FoamParticle) -> usize {
        let t = self.target;
        // SAFETY: `index < capacity` was checked in `reserve`, and the slot
        // came from a fetch-add nobody else observed.
        unsafe {
            *t.positions.add(self.index) = particle.position;
            *t.velocities.add(self.index) = particle.velocity;
            *t.colors.add(self.index) = particle.color;
            *t.attributes.add(self.index) = particle.attributes;
        }
        self.index
    }
}

/// Per-fluid-particle emission potential.
///
/// Accumulates fractional readiness to emit across steps. Stored as f32
/// bits in relaxed atomics so the emission stage can update its entries in
/// parallel without unsafe aliasing.
#[derive(Debug, Default)]
pub struct EmitPotentials {
    values: Vec<AtomicU32>,
}

impl EmitPotentials {
    pub fn new(len: usize) -> Self {
        let mut potentials = Self::default();
        potentials.resize(len);
        potentials
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resize to `len` entries. New entries start at zero; existing entries
    /// keep their value.
    pub fn resize(&mut self, len: usize) {
        self.values.resize_with(len, || AtomicU32::new(0.0_f32.to_bits()));
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values
            .get(index)
            .map(|v| f32::from_bits(v.load(Ordering::Relaxed)))
    }

    #[inline]
    pub fn set(&self, index: usize, value: f32) {
        if let Some(v) = self.values.get(index) {
            v.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn reset(&mut self) {
        for v in self.values.iter_mut() {
            *v.get_mut() = 0.0_f32.to_bits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_returns_post_decrement() {
        let counters = AtomicCounterBlock::new();
        for expected in 0..3 {
            assert_eq!(counters.push_consume(), expected);
        }
        assert_eq!(counters.pop_consume(), 2);
        assert_eq!(counters.pop_consume(), 1);
        assert_eq!(counters.pop_consume(), 0);
        assert_eq!(counters.pop_consume(), -1, "exhausted stack goes negative");
    }

    #[test]
    fn test_swap_ignores_leftover_pops() {
        let mut counters = AtomicCounterBlock::new();
        for _ in 0..5 {
            counters.reserve_produce();
        }
        counters.pop_consume();
        counters.pop_consume();

        counters.swap_for_next_cycle();
        assert_eq!(counters.consume(), 5);
        assert_eq!(counters.produce(), 0);
    }

    #[test]
    fn test_clamp_negative_consume() {
        let mut counters = AtomicCounterBlock::new();
        counters.pop_consume();
        counters.clamp_consume(8);
        assert_eq!(counters.consume(), 0);
    }

    #[test]
    fn test_cursors_saturate_instead_of_wrapping() {
        let counters = AtomicCounterBlock::new();
        counters.produce.store(i32::MAX - 1, Ordering::Relaxed);
        assert_eq!(counters.reserve_produce(), i32::MAX - 1);
        assert_eq!(counters.reserve_produce(), i32::MAX);
        assert_eq!(counters.reserve_produce(), i32::MAX);
        assert_eq!(counters.produce(), i32::MAX);
    }

    #[test]
    fn test_saturated_cursor_hands_out_no_slot() {
        let mut buffer = ParticleBuffer::new(4);
        let counters = AtomicCounterBlock::new();
        counters.produce.store(i32::MAX, Ordering::Relaxed);
        let target = AppendTarget::new(&mut buffer, &counters, AppendCursor::Produce);
        for _ in 0..3 {
            assert!(target.push(FoamParticle::default()).is_none());
        }
    }
}
