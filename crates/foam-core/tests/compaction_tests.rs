use foam_core::compaction::compact;
use foam_core::counters::AtomicCounterBlock;
use foam_core::particle::{FoamParticle, ParticleBuffer};
use glam::Vec4;

fn tagged(i: usize) -> FoamParticle {
    let t = i as f32;
    FoamParticle {
        position: Vec4::new(t, t + 0.5, -t, 3.0),
        velocity: Vec4::new(0.0, t, 0.0, 10.0),
        color: Vec4::new(1.0, 1.0, 1.0, 0.25),
        attributes: Vec4::new(0.5, 0.2, 0.02, t),
    }
}

#[test]
fn test_compact_copies_every_slot() {
    let capacity = 10_000;
    let mut advected = ParticleBuffer::new(capacity);
    for i in 0..capacity {
        advected.set(i, tagged(i));
    }
    let mut stable = ParticleBuffer::new(capacity);
    stable.set(0, FoamParticle::default());

    let mut counters = AtomicCounterBlock::new();
    compact(&advected, &mut stable, &mut counters);

    for i in 0..capacity {
        assert_eq!(stable.get(i), Some(tagged(i)), "slot {i} not copied");
    }
}

#[test]
fn test_compact_rolls_counters() {
    let mut advected = ParticleBuffer::new(8);
    let mut stable = ParticleBuffer::new(8);
    let mut counters = AtomicCounterBlock::new();
    for i in 0..3 {
        advected.set(i, tagged(i));
        counters.reserve_produce();
    }
    // stale count from the previous cycle
    counters.push_consume();

    compact(&advected, &mut stable, &mut counters);
    assert_eq!(counters.consume(), 3);
    assert_eq!(counters.produce(), 0);
    assert_eq!(counters.alive_count(stable.capacity()), 3);

    // second cycle with nothing produced empties the buffer
    compact(&advected, &mut stable, &mut counters);
    assert_eq!(counters.consume(), 0);
}

#[test]
fn test_compact_keeps_overflowed_count() {
    let advected = ParticleBuffer::new(4);
    let mut stable = ParticleBuffer::new(4);
    let mut counters = AtomicCounterBlock::new();
    for _ in 0..6 {
        counters.reserve_produce();
    }

    compact(&advected, &mut stable, &mut counters);
    assert_eq!(counters.consume(), 6, "raw count survives, readers clamp");
    assert_eq!(counters.alive_count(4), 4);
}
