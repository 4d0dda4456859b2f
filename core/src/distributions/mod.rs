//! Sampling transforms applied to raw generator output
//!
//! Each distribution holds its shape parameters plus whatever latent state
//! the sampling algorithm needs for exact resumption. Parameters are
//! validated when configured, never at draw time.

/// Gaussian transform with a cached second deviate.
///
/// Box-Muller produces deviates in pairs; the unused one is kept as latent
/// state so consecutive draws consume the generator at half rate. That
/// spare is part of what a checkpoint must persist: without it, the first
/// post-restore draw would diverge from the uninterrupted run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalState {
    location: f64,
    scale: f64,
    spare: Option<f64>,
}

impl NormalState {
    /// New transform with the given location and scale.
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive and finite.
    pub fn new(location: f64, scale: f64) -> Self {
        assert!(
            scale > 0.0 && scale.is_finite() && location.is_finite(),
            "scale must be positive"
        );
        Self {
            location,
            scale,
            spare: None,
        }
    }

    /// Standard form: location 0, scale 1.
    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Rebuild from checkpointed fields.
    ///
    /// Returns `None` when the persisted parameters are unusable; the
    /// caller treats that the same as a missing section.
    pub fn restore(location: f64, scale: f64, latent: Option<f64>) -> Option<Self> {
        if !(scale > 0.0 && scale.is_finite() && location.is_finite()) {
            return None;
        }
        if latent.is_some_and(|z| !z.is_finite()) {
            return None;
        }
        Some(Self {
            location,
            scale,
            spare: latent,
        })
    }

    /// Replace the shape parameters.
    ///
    /// Any cached deviate belongs to the old parameters and is dropped.
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive and finite.
    pub fn set_limits(&mut self, location: f64, scale: f64) {
        assert!(
            scale > 0.0 && scale.is_finite() && location.is_finite(),
            "scale must be positive"
        );
        self.location = location;
        self.scale = scale;
        self.spare = None;
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The latent standard deviate awaiting consumption, if any.
    pub fn latent(&self) -> Option<f64> {
        self.spare
    }

    /// Consume the cached deviate, scaled to the current parameters.
    pub fn cached(&mut self) -> Option<f64> {
        self.spare.take().map(|z| self.location + self.scale * z)
    }

    /// Box-Muller transform of two unit-interval draws.
    ///
    /// Returns one deviate and caches its pair partner for the next call.
    pub fn transform(&mut self, u1: f64, u2: f64) -> f64 {
        // ln(0) guard: a draw of exactly 0.0 is mapped to the smallest
        // positive f64 instead of producing an infinite radius.
        let u1 = u1.max(f64::MIN_POSITIVE);
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;

        self.spare = Some(radius * theta.sin());
        self.location + self.scale * (radius * theta.cos())
    }
}

impl Default for NormalState {
    fn default() -> Self {
        Self::standard()
    }
}

/// Uniform transform over a half-open range.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformState {
    lower: f64,
    upper: f64,
}

impl UniformState {
    /// New transform over `[lower, upper)`.
    ///
    /// # Panics
    /// Panics if `upper` is not strictly greater than `lower`, or either
    /// bound is non-finite.
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(
            upper > lower && lower.is_finite() && upper.is_finite(),
            "upper must be greater than lower"
        );
        Self { lower, upper }
    }

    /// Unit range `[0, 1)`.
    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Rebuild from checkpointed fields; `None` when unusable.
    pub fn restore(lower: f64, upper: f64) -> Option<Self> {
        if upper > lower && lower.is_finite() && upper.is_finite() {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// Replace the bounds.
    ///
    /// # Panics
    /// Panics if `upper` is not strictly greater than `lower`, or either
    /// bound is non-finite.
    pub fn set_limits(&mut self, lower: f64, upper: f64) {
        assert!(
            upper > lower && lower.is_finite() && upper.is_finite(),
            "upper must be greater than lower"
        );
        self.lower = lower;
        self.upper = upper;
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Map a unit-interval draw onto the configured range.
    pub fn sample(&self, unit: f64) -> f64 {
        self.lower + unit * (self.upper - self.lower)
    }
}

impl Default for UniformState {
    fn default() -> Self {
        Self::standard()
    }
}
