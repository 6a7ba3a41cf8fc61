/// Tolerance used by every "is this effectively zero" decision in the runtime.
pub const NEAR_ZERO: f32 = 1.0e-6;

#[inline]
pub fn is_near_zero(value: f32) -> bool {
    value.abs() <= NEAR_ZERO
}

#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_zero_is_symmetric() {
        assert!(is_near_zero(0.0));
        assert!(is_near_zero(-1.0e-7));
        assert!(!is_near_zero(1.0e-3));
        assert!(!is_near_zero(-1.0e-3));
    }

    #[test]
    fn lerp_hits_endpoints() {
        assert_eq!(lerp(1.0, 3.0, 0.0), 1.0);
        assert_eq!(lerp(1.0, 3.0, 1.0), 3.0);
        assert_eq!(lerp(1.0, 3.0, 0.5), 2.0);
    }
}
