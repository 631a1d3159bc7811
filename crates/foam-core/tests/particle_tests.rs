use foam_core::particle::{FoamParticle, ParticleBuffer};
use glam::Vec4;

fn sample(i: usize) -> FoamParticle {
    let t = i as f32;
    FoamParticle {
        position: Vec4::new(t, t + 1.0, t + 2.0, 5.0),
        velocity: Vec4::new(-t, 0.0, 0.0, 10.0),
        color: Vec4::new(1.0, 1.0, 1.0, 0.25),
        attributes: Vec4::new(0.5, 0.2, 0.02, 0.5),
    }
}

#[test]
fn test_buffer_starts_empty() {
    let buffer = ParticleBuffer::new(8);
    assert_eq!(buffer.capacity(), 8);
    for i in 0..8 {
        let p = buffer.get(i).expect("slot in range");
        assert!(!p.is_alive(), "slot {i} should start dead");
    }
    assert!(buffer.get(8).is_none());
}

#[test]
fn test_set_ignores_out_of_range() {
    let mut buffer = ParticleBuffer::new(2);
    assert!(buffer.set(1, sample(1)));
    assert!(!buffer.set(2, sample(2)));
    assert_eq!(buffer.get(1), Some(sample(1)));

    buffer.clear();
    assert_eq!(buffer.get(1), Some(FoamParticle::default()));
}

#[test]
fn test_as_floats_is_xyzw_per_particle() {
    let mut buffer = ParticleBuffer::new(3);
    for i in 0..3 {
        buffer.set(i, sample(i));
    }

    let positions = ParticleBuffer::as_floats(buffer.positions());
    assert_eq!(positions.len(), 12);
    assert_eq!(&positions[4..8], &[1.0, 2.0, 3.0, 5.0]);

    let velocities = ParticleBuffer::as_floats(buffer.velocities());
    assert_eq!(velocities[8], -2.0);
    assert_eq!(velocities[11], 10.0, "w carries buoyancy");

    let attributes = ParticleBuffer::as_floats(buffer.attributes());
    assert_eq!(&attributes[..4], &[0.5, 0.2, 0.02, 0.5]);
}

#[test]
fn test_particle_accessors() {
    let p = FoamParticle {
        position: Vec4::new(0.0, 0.0, 0.0, 14.0),
        ..sample(0)
    };
    assert_eq!(p.life(), 0.5);
    assert_eq!(p.decay_rate(), 0.2);
    assert_eq!(p.size(), 0.02);
    assert_eq!(p.drag(), 0.5);
    assert_eq!(p.buoyancy(), 10.0);
    assert_eq!(p.neighbour_count(), 14);
    assert!(p.is_alive());
}
