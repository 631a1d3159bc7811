use foam_core::math::*;
use glam::Vec3;

#[test]
fn test_hash13_range() {
    for i in 0..1000 {
        let p = Vec3::new(i as f32 * 0.1, i as f32 * 0.37, i as f32 * 1.3);
        let h = hash13(p);
        assert!((0.0..1.0).contains(&h), "hash13({p}) = {h} out of range");
    }
}

#[test]
fn test_hash33_range() {
    for i in 0..100 {
        for j in 0..100 {
            let p = Vec3::new(i as f32 * 0.1, j as f32 * 0.1, (i + j) as f32 * 0.05);
            let h = hash33(p);
            for c in h.to_array() {
                assert!((0.0..1.0).contains(&c), "hash33({p}) = {h} out of range");
            }
        }
    }
}

#[test]
fn test_hash_deterministic() {
    let p = Vec3::new(1.25, -3.5, 0.75);
    assert_eq!(hash13(p), hash13(p));
    assert_eq!(hash33(p), hash33(p));
}

#[test]
fn test_hash33_varies_with_seed() {
    // Nearby inputs should not collapse onto the same sample.
    let base = Vec3::new(0.3, 0.4, 0.5);
    let a = hash33(base);
    let b = hash33(base + Vec3::splat(0.01));
    assert_ne!(a, b);
}

#[test]
fn test_remap01() {
    assert_eq!(remap01(1.0, 2.0, 4.0), 0.0);
    assert_eq!(remap01(2.0, 2.0, 4.0), 0.0);
    assert_eq!(remap01(3.0, 2.0, 4.0), 0.5);
    assert_eq!(remap01(4.0, 2.0, 4.0), 1.0);
    assert_eq!(remap01(100.0, 2.0, 4.0), 1.0);
}

#[test]
fn test_orthonormal_basis() {
    let (b1, b2, b3) = orthonormal_basis(Vec3::new(0.0, 3.0, 0.0));
    assert!((b1 - Vec3::Y).length() < 1e-6);
    assert!((b2.length() - 1.0).abs() < 1e-5);
    assert!((b3.length() - 1.0).abs() < 1e-5);
    assert!(b1.dot(b2).abs() < 1e-6);
    assert!(b1.dot(b3).abs() < 1e-6);
    assert!(b2.dot(b3).abs() < 1e-6);
}

#[test]
fn test_orthonormal_basis_zero_axis() {
    let (b1, b2, b3) = orthonormal_basis(Vec3::ZERO);
    assert_eq!(b1, Vec3::ZERO);
    assert_eq!(b2, Vec3::ZERO);
    assert_eq!(b3, Vec3::ZERO);
}

#[test]
fn test_orthonormal_basis_tiny_axis_falls_back_to_raw() {
    let axis = Vec3::new(0.0, 1e-7, 0.0);
    let (b1, _, _) = orthonormal_basis(axis);
    assert_eq!(b1, axis);
}

#[test]
fn test_random_in_cylinder_inside() {
    let p1 = Vec3::ZERO;
    let p2 = Vec3::new(0.0, 1.0, 0.0);
    let radius = 0.5;
    for seed in 0..50 {
        let (pos, offset) = random_in_cylinder(seed as f32, p1, p2, radius);
        assert!(offset.length() <= radius + 1e-5, "offset {offset} outside disk");
        assert!(offset.y.abs() < 1e-5, "offset {offset} not perpendicular to axis");
        let along = (pos - offset).y;
        assert!((0.0..=1.0).contains(&along), "sample {pos} outside cylinder");
    }
}

#[test]
fn test_random_in_cylinder_deterministic() {
    let p1 = Vec3::new(0.2, 0.4, -1.0);
    let p2 = Vec3::new(0.5, 0.1, -0.8);
    for seed in 0..10 {
        let a = random_in_cylinder(seed as f32, p1, p2, 0.1);
        let b = random_in_cylinder(seed as f32, p1, p2, 0.1);
        assert_eq!(a, b, "seed {seed} not reproducible");
    }
}

#[test]
fn test_random_in_cylinder_zero_axis() {
    let p = Vec3::new(1.0, 2.0, 3.0);
    let (pos, offset) = random_in_cylinder(0.0, p, p, 0.3);
    assert_eq!(offset, Vec3::ZERO);
    assert_eq!(pos, p);
}
