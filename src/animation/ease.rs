use std::time::Duration;

/// Easing curve applied to normalized animation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Identity.
    Linear,
    /// Quadratic acceleration.
    InQuad,
    /// Quadratic deceleration.
    OutQuad,
    /// Quadratic acceleration then deceleration.
    InOutQuad,
    /// Cubic acceleration.
    InCubic,
    /// Cubic deceleration.
    #[default]
    OutCubic,
    /// Cubic acceleration then deceleration.
    InOutCubic,
}

impl Ease {
    /// Map `t` (clamped to `[0, 1]`) through the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// Eased progress of an animation `elapsed` into a run of length `duration`.
    pub fn progress(self, elapsed: Duration, duration: Duration, looping: bool) -> f64 {
        self.apply(normalized_time(elapsed, duration, looping))
    }
}

/// Fraction of `duration` covered by `elapsed`.
///
/// Non-looping runs saturate at `1.0`; looping runs wrap. A zero duration is treated as already
/// finished.
pub fn normalized_time(elapsed: Duration, duration: Duration, looping: bool) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let t = elapsed.as_secs_f64() / duration.as_secs_f64();
    if looping { t.fract() } else { t.min(1.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
