use std::f32::consts::PI;

/// Poly6 smoothing kernel used to weight fluid neighbours.
///
/// Returns `W(d, r) = norm / r^k * (r^2 - d^2)^3` when `d <= r` and `0.0`
/// otherwise, with `norm = 315 / (64 * PI)`, `k = 9` in 3D and
/// `norm = 4 / PI`, `k = 8` in 2D.
///
/// Only ever used as an interpolation weight, so it is divided back out by
/// the weight sum. Strictly decreasing on `[0, r]`, peak at `d = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Poly6Kernel {
    pub two_d: bool,
}

impl Poly6Kernel {
    pub fn new(two_d: bool) -> Self {
        Self { two_d }
    }

    #[inline]
    pub fn w(&self, d: f32, radius: f32) -> f32 {
        if d > radius || radius <= 0.0 {
            return 0.0;
        }
        let r2 = radius * radius;
        let diff = r2 - d * d;
        let cube = diff * diff * diff;
        if self.two_d {
            let r8 = r2 * r2 * r2 * r2;
            4.0 / (PI * r8) * cube
        } else {
            let r9 = r2 * r2 * r2 * r2 * radius;
            315.0 / (64.0 * PI * r9) * cube
        }
    }
}
