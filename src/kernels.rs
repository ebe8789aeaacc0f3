// 2D smoothing kernels with compact support [0, radius)

use std::f32::consts::PI;

/// Density kernel (spiky, squared falloff). Normalized so that the integral
/// over the support disk is independent of the radius.
#[inline]
pub fn spiky_pow2(dst: f32, radius: f32) -> f32 {
    if dst >= radius {
        return 0.0;
    }
    let volume = PI * radius.powi(4) / 6.0;
    (radius - dst) * (radius - dst) / volume
}

/// Slope of the density kernel. Negative inside the support, so a pressure
/// contribution directed away from a neighbor grows as the pair closes in.
#[inline]
pub fn spiky_pow2_derivative(dst: f32, radius: f32) -> f32 {
    if dst >= radius {
        return 0.0;
    }
    let scale = 12.0 / (PI * radius.powi(4));
    (dst - radius) * scale
}
