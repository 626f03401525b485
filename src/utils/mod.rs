/// Linearly maps `value` from the `input` range onto the `output` range.
///
/// The result is not clamped, so values outside `input` land outside `output`.
/// A degenerate input range (`input.0 == input.1`) divides by zero.
#[inline]
pub fn map_value(value: f32, input: (f32, f32), output: (f32, f32)) -> f32 {
    (value - input.0) * (output.1 - output.0) / (input.1 - input.0) + output.0
}

/// Options for [`range`].
#[derive(Debug, Clone, Copy)]
pub struct RangeOptions {
    /// First value, inclusive.
    pub from: f32,
    /// Upper bound, exclusive.
    pub to: f32,
    pub step: f32,
}

impl RangeOptions {
    pub const fn to(to: f32) -> Self {
        Self {
            from: 0.0,
            to,
            step: 1.0,
        }
    }

    pub const fn start(mut self, from: f32) -> Self {
        self.from = from;
        self
    }

    pub const fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }
}

/// Produces `floor((to - from) / step)` values starting at `from`.
pub fn range(options: RangeOptions) -> Vec<f32> {
    let RangeOptions { from, to, step } = options;
    let count = ((to - from) / step).floor();

    // NaN and infinite counts come from a zero step
    if !count.is_finite() || count <= 0.0 {
        return Vec::new();
    }

    (0..count as usize).map(|i| from + i as f32 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_value_endpoints() {
        assert_eq!(map_value(2.0, (2.0, 10.0), (-1.0, 5.0)), -1.0);
        assert_eq!(map_value(10.0, (2.0, 10.0), (-1.0, 5.0)), 5.0);
        assert_eq!(map_value(50.0, (0.0, 100.0), (0.0, 1.0)), 0.5);
    }

    #[test]
    fn test_map_value_is_monotonic() {
        let mut previous = f32::NEG_INFINITY;
        for i in 0..100 {
            let mapped = map_value(i as f32, (0.0, 99.0), (20.0, 20_000.0));
            assert!(mapped > previous);
            previous = mapped;
        }
    }

    #[test]
    fn test_map_value_does_not_clamp() {
        assert_eq!(map_value(200.0, (0.0, 100.0), (0.0, 1.0)), 2.0);
        assert_eq!(map_value(-100.0, (0.0, 100.0), (0.0, 1.0)), -1.0);
    }

    #[test]
    fn test_map_value_degenerate_input() {
        assert!(!map_value(1.0, (3.0, 3.0), (0.0, 1.0)).is_finite());
    }

    #[test]
    fn test_range() {
        assert_eq!(
            range(RangeOptions::to(10.0)),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );
        assert_eq!(
            range(RangeOptions::to(10.0).start(2.0).step(3.0)),
            vec![2.0, 5.0]
        );
        // The count is floored, so a partial last step is dropped
        assert_eq!(
            range(RangeOptions::to(11.0).start(2.0).step(3.0)),
            vec![2.0, 5.0, 8.0]
        );
        assert!(range(RangeOptions::to(0.0)).is_empty());
    }

    #[test]
    fn test_range_degenerate_step() {
        assert!(range(RangeOptions::to(10.0).step(0.0)).is_empty());
        assert!(range(RangeOptions::to(10.0).step(-1.0)).is_empty());
    }
}
