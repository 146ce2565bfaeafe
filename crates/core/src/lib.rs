//! Core units, constants, and shared primitives for the Blueshift warp drive workspace.

/// Physical and gameplay constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Speed of light in vacuum (m/s). Warp speeds are expressed as fractions of this.
    pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;
    /// Resource produced by generators and consumed by coils to sustain a warp field.
    pub const WARP_SIMULATION_RESOURCE: &str = "GravityWaves";
    /// Power multiplier reported when coils require nothing. Never exactly zero.
    pub const POWER_MULTIPLIER_EPSILON: f64 = 0.0001;
    /// Fraction of a resource request that must be granted for it to count as satisfied.
    pub const RESOURCE_GRANT_TOLERANCE: f64 = 0.999;
    /// Throttle changes smaller than this do not re-arm the frame skip window.
    pub const THROTTLE_EPSILON: f64 = 1.0e-4;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::SPEED_OF_LIGHT_M_S;

    /// Convert a fraction of light speed to metres per second.
    #[inline]
    pub fn c_to_ms(v: f64) -> f64 {
        v * SPEED_OF_LIGHT_M_S
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0, 0.0, 0.0];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector in the direction of `v`, or the zero vector when `v` has no length.
    #[inline]
    pub fn normalize(v: &Vector3) -> Vector3 {
        let length = norm(v);
        if length > 0.0 && length.is_finite() {
            scale(v, 1.0 / length)
        } else {
            ZERO
        }
    }

    /// Distance between two points.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        norm(&sub(a, b))
    }
}
