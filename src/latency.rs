//! Latency tolerance requests from the OS power management layer.

/// Latency tolerance request meaning "no constraint imposed".
pub const LATENCY_TOLERANCE_NO_CONSTRAINT: i32 = -1;

/// Latency tolerance request meaning "any latency is acceptable".
pub const LATENCY_TOLERANCE_ANY: i32 = i32::MAX;

/// Normalize an externally supplied latency tolerance value to a latency
/// ceiling in microseconds.
///
/// Both reserved sentinel values map to `u64::MAX` (unconstrained), as does
/// any other negative request. A value of `0` disables autonomous
/// transitions entirely.
pub fn normalize_latency_tolerance(value: i32) -> u64 {
    match value {
        LATENCY_TOLERANCE_NO_CONSTRAINT | LATENCY_TOLERANCE_ANY => u64::MAX,
        value if value < 0 => u64::MAX,
        value => value as u64,
    }
}

/// Per-device latency tolerance control surface exposed to the OS power
/// management layer.
///
/// The manager calls these strictly on transitions of the controller's APST
/// support flag across identify refreshes, never redundantly.
pub trait LatencyToleranceHook {
    /// Expose the latency tolerance control for this device.
    fn expose_latency_tolerance(&mut self);

    /// Hide the latency tolerance control for this device.
    fn hide_latency_tolerance(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_mean_unconstrained() {
        assert_eq!(
            normalize_latency_tolerance(LATENCY_TOLERANCE_NO_CONSTRAINT),
            u64::MAX
        );
        assert_eq!(normalize_latency_tolerance(LATENCY_TOLERANCE_ANY), u64::MAX);
    }

    #[test]
    fn other_negative_values_mean_unconstrained() {
        assert_eq!(normalize_latency_tolerance(-7), u64::MAX);
    }

    #[test]
    fn finite_values_pass_through() {
        assert_eq!(normalize_latency_tolerance(0), 0);
        assert_eq!(normalize_latency_tolerance(5_000), 5_000);
        assert_eq!(
            normalize_latency_tolerance(i32::MAX - 1),
            (i32::MAX - 1) as u64
        );
    }
}
