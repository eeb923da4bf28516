//! Response curve mapping rest-pose steps to bone weights.
//!
//! An authored 1D curve made of cubic Hermite keys. Each bone's step (its
//! normalized distance along the rest chain) is pushed through the curve to
//! get the parameter at which the bone sits on the driven curve.

use crate::{Result, RigError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A key on a [`ResponseCurve`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keyframe {
    /// Input value of the key.
    pub time: f64,
    /// Output value of the key.
    pub value: f64,
    /// Slope arriving at the key.
    pub in_tangent: f64,
    /// Slope leaving the key.
    pub out_tangent: f64,
}

impl Keyframe {
    /// Create a key with explicit slopes.
    #[must_use]
    pub const fn new(time: f64, value: f64, in_tangent: f64, out_tangent: f64) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// Create a key with the same slope on both sides.
    #[must_use]
    pub const fn smooth(time: f64, value: f64, tangent: f64) -> Self {
        Self::new(time, value, tangent, tangent)
    }

    fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.value.is_finite()
            && self.in_tangent.is_finite()
            && self.out_tangent.is_finite()
    }
}

/// Piecewise cubic Hermite curve over sorted keys.
///
/// Outside the key range the curve holds the first or last key's value.
///
/// # Example
///
/// ```
/// use tentacle_rig::ResponseCurve;
///
/// let curve = ResponseCurve::linear();
/// assert!((curve.evaluate(0.25) - 0.25).abs() < 1e-12);
/// assert_eq!(curve.evaluate(2.0), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")
)]
pub struct ResponseCurve {
    keys: Vec<Keyframe>,
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl ResponseCurve {
    /// Create a curve from keys sorted by time.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::MissingResponseCurve`] for an empty key list and
    /// [`RigError::InvalidConfig`] for non-finite or unsorted keys.
    pub fn new(keys: Vec<Keyframe>) -> Result<Self> {
        if keys.is_empty() {
            return Err(RigError::MissingResponseCurve);
        }
        if let Some(index) = keys.iter().position(|k| !k.is_finite()) {
            return Err(RigError::invalid_config(format!(
                "response key {index} is not finite"
            )));
        }
        if let Some(index) = keys.windows(2).position(|pair| pair[1].time <= pair[0].time) {
            return Err(RigError::invalid_config(format!(
                "response keys must have strictly increasing times (key {})",
                index + 1
            )));
        }
        Ok(Self { keys })
    }

    /// Straight line from `(0, 0)` to `(1, 1)`.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            keys: vec![Keyframe::smooth(0.0, 0.0, 1.0), Keyframe::smooth(1.0, 1.0, 1.0)],
        }
    }

    /// Straight line between two points.
    ///
    /// Falls back to a constant at `start_value` when the times coincide.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidConfig`] when `end_time` comes before
    /// `start_time` or an input is not finite.
    pub fn linear_between(
        start_time: f64,
        start_value: f64,
        end_time: f64,
        end_value: f64,
    ) -> Result<Self> {
        let span = end_time - start_time;
        if span.abs() < f64::EPSILON {
            return Self::new(vec![Keyframe::smooth(start_time, start_value, 0.0)]);
        }
        if span < 0.0 {
            return Err(RigError::invalid_config(format!(
                "response span is reversed: {start_time} > {end_time}"
            )));
        }
        let slope = (end_value - start_value) / span;
        Self::new(vec![
            Keyframe::smooth(start_time, start_value, slope),
            Keyframe::smooth(end_time, end_value, slope),
        ])
    }

    /// Constant curve.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            keys: vec![Keyframe::smooth(0.0, value, 0.0)],
        }
    }

    /// Evaluate the curve at `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if x.is_nan() || x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        let index = self.keys.partition_point(|k| k.time <= x);
        let a = &self.keys[index - 1];
        let b = &self.keys[index];
        let dt = b.time - a.time;
        let s = (x - a.time) / dt;

        hermite(a.value, b.value, a.out_tangent * dt, b.in_tangent * dt, s)
    }

    /// Whether the curve never decreases, checked at the keys and at
    /// `samples` points per span.
    #[must_use]
    pub fn is_non_decreasing(&self, samples: usize) -> bool {
        let samples = samples.max(1);
        let mut previous = f64::NEG_INFINITY;
        for pair in self.keys.windows(2) {
            for i in 0..=samples {
                let x = pair[0].time + (pair[1].time - pair[0].time) * (i as f64 / samples as f64);
                let y = self.evaluate(x);
                if y < previous - 1e-12 {
                    return false;
                }
                previous = y;
            }
        }
        true
    }

    /// The curve's keys.
    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }
}

impl TryFrom<Vec<Keyframe>> for ResponseCurve {
    type Error = RigError;

    fn try_from(keys: Vec<Keyframe>) -> Result<Self> {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<Keyframe> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}

#[inline]
fn hermite(p0: f64, p1: f64, m0: f64, m1: f64, s: f64) -> f64 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_is_identity() {
        let curve = ResponseCurve::linear();
        for i in 0..=10 {
            let x = f64::from(i) / 10.0;
            assert_relative_eq!(curve.evaluate(x), x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_clamped_outside_range() {
        let curve = ResponseCurve::linear();
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(5.0), 1.0);
        assert_eq!(curve.evaluate(f64::NAN), 0.0);
    }

    #[test]
    fn test_passes_through_keys() {
        let curve = ResponseCurve::new(vec![
            Keyframe::smooth(0.0, 0.0, 0.0),
            Keyframe::smooth(0.5, 0.8, 0.5),
            Keyframe::smooth(1.0, 1.0, 0.0),
        ])
        .unwrap();

        assert_relative_eq!(curve.evaluate(0.5), 0.8, epsilon = 1e-12);
        assert_relative_eq!(curve.evaluate(1.0), 1.0, epsilon = 1e-12);
        assert!(curve.is_non_decreasing(32));
    }

    #[test]
    fn test_ease_in_out() {
        let curve = ResponseCurve::new(vec![
            Keyframe::smooth(0.0, 0.0, 0.0),
            Keyframe::smooth(1.0, 1.0, 0.0),
        ])
        .unwrap();

        // Smoothstep: 3s² - 2s³
        assert_relative_eq!(curve.evaluate(0.25), 0.156_25, epsilon = 1e-12);
        assert_relative_eq!(curve.evaluate(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_detects_decreasing_curve() {
        let curve = ResponseCurve::new(vec![
            Keyframe::smooth(0.0, 1.0, 0.0),
            Keyframe::smooth(1.0, 0.0, 0.0),
        ])
        .unwrap();
        assert!(!curve.is_non_decreasing(8));
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(
            ResponseCurve::new(Vec::new()).unwrap_err(),
            RigError::MissingResponseCurve
        );
        let unsorted = vec![Keyframe::smooth(1.0, 0.0, 0.0), Keyframe::smooth(0.0, 1.0, 0.0)];
        assert!(ResponseCurve::new(unsorted).unwrap_err().is_config_error());
        let nan = vec![Keyframe::smooth(f64::NAN, 0.0, 0.0)];
        assert!(ResponseCurve::new(nan).is_err());
    }

    #[test]
    fn test_constant_and_degenerate_linear() {
        assert_eq!(ResponseCurve::constant(0.3).evaluate(0.7), 0.3);
        let flat = ResponseCurve::linear_between(0.5, 0.2, 0.5, 0.9).unwrap();
        assert_eq!(flat.keys().len(), 1);
        assert_eq!(flat.evaluate(0.9), 0.2);
    }

    #[test]
    fn test_linear_between_rejects_bad_span() {
        let reversed = ResponseCurve::linear_between(1.0, 0.0, 0.0, 1.0);
        assert!(reversed.unwrap_err().is_config_error());
        assert!(ResponseCurve::linear_between(0.0, 0.0, f64::NAN, 1.0).is_err());

        let ramp = ResponseCurve::linear_between(0.0, 0.2, 2.0, 0.6).unwrap();
        assert_relative_eq!(ramp.evaluate(1.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_keys_convert_through_validation() {
        let unsorted = vec![Keyframe::smooth(1.0, 0.0, 0.0), Keyframe::smooth(0.0, 1.0, 0.0)];
        assert!(ResponseCurve::try_from(unsorted).unwrap_err().is_config_error());

        let curve = ResponseCurve::try_from(vec![
            Keyframe::smooth(0.0, 0.0, 1.0),
            Keyframe::smooth(1.0, 1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(curve, ResponseCurve::linear());
        assert_eq!(Vec::from(curve).len(), 2);
    }
}
