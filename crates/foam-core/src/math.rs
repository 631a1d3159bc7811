use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Threshold shared by every degenerate-geometry guard.
pub const EPSILON: f32 = 1e-5;

/// GLSL-style fract: `x - floor(x)`, always in [0,1).
#[inline]
pub fn fract_gl(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn fract_gl3(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// Hash vec3 to vec3 in [0,1) - port of GLSL hash33 ("hash without sine")
pub fn hash33(p: Vec3) -> Vec3 {
    let mut p3 = fract_gl3(p * Vec3::new(0.1031, 0.1030, 0.0973));
    p3 += p3.dot(Vec3::new(p3.y, p3.x, p3.z) + 33.33);
    fract_gl3(
        (Vec3::new(p3.x, p3.x, p3.y) + Vec3::new(p3.y, p3.x, p3.x))
            * Vec3::new(p3.z, p3.y, p3.x),
    )
}

/// Hash vec3 to [0,1) - port of GLSL hash13
pub fn hash13(p: Vec3) -> f32 {
    let mut p3 = fract_gl3(p * 0.1031);
    p3 += p3.dot(Vec3::new(p3.z, p3.y, p3.x) + 31.32);
    fract_gl((p3.x + p3.y) * p3.z)
}

/// Remap `value` from `[lo, hi]` to [0,1], clamping at both ends.
///
/// Requires `hi > lo`.
#[inline]
pub fn remap01(value: f32, lo: f32, hi: f32) -> f32 {
    (value.min(hi) - value.min(lo)) / (hi - lo)
}

/// Orthonormal frame around `axis`.
///
/// `b1` is the normalized axis, or the raw axis if its length is below
/// [`EPSILON`]. `b2` and `b3` span the plane perpendicular to it; they
/// collapse to zero when the axis is zero or parallel to +X.
pub fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3, Vec3) {
    let d = axis.length();
    let b1 = if d > EPSILON { axis / d } else { axis };
    let b2 = b1.cross(Vec3::X).normalize_or_zero();
    let b3 = b2.cross(b1);
    (b1, b2, b3)
}

/// Uniformly sample a point inside the cylinder from `p1` to `p2`.
///
/// Returns `(position, radial_offset)`. The offset is the disk component of
/// the sample; callers use it as an outward velocity. Deterministic in
/// `(seed, p1, p2)`.
pub fn random_in_cylinder(seed: f32, p1: Vec3, p2: Vec3, radius: f32) -> (Vec3, Vec3) {
    let rand = hash33(p1.lerp(p2, seed));

    let axis = p2 - p1;
    let (b1, b2, b3) = orthonormal_basis(axis);
    let d = axis.length();

    let theta = rand.y * TAU;
    let disc = radius * rand.x.sqrt() * Vec2::new(theta.cos(), theta.sin());

    let offset = b2 * disc.x + b3 * disc.y;
    let position = p1 + b1 * d * rand.z + offset;
    (position, offset)
}
