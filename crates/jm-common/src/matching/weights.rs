use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default aggregation weights.
/// Skills dominate; semantic similarity and domain act as tie-breakers.
pub const DEFAULT_WEIGHTS: ComponentWeights = ComponentWeights {
    skills: 0.35,
    experience: 0.25,
    domain: 0.15,
    location: 0.10,
    semantic: 0.15,
};

const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    #[error("weight `{name}` must be a finite value in [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("weights must sum to 1.0, got {0}")]
    BadSum(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub skills: f64,
    pub experience: f64,
    pub domain: f64,
    pub location: f64,
    pub semantic: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ComponentWeights {
    pub fn new(
        skills: f64,
        experience: f64,
        domain: f64,
        location: f64,
        semantic: f64,
    ) -> Result<Self, WeightsError> {
        let weights = Self {
            skills,
            experience,
            domain,
            location,
            semantic,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, value) in self.named() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(WeightsError::OutOfRange { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.domain + self.location + self.semantic
    }

    /// Weighted sum of component scores, clamped to [0, 1].
    pub fn combine(
        &self,
        skills: f64,
        experience: f64,
        domain: f64,
        location: f64,
        semantic: f64,
    ) -> f64 {
        let total = skills * self.skills
            + experience * self.experience
            + domain * self.domain
            + location * self.location
            + semantic * self.semantic;
        total.clamp(0.0, 1.0)
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("skills", self.skills),
            ("experience", self.experience),
            ("domain", self.domain),
            ("location", self.location),
            ("semantic", self.semantic),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
        assert!(DEFAULT_WEIGHTS.validate().is_ok());
    }

    #[test]
    fn rejects_bad_sums_and_negative_weights() {
        assert!(matches!(
            ComponentWeights::new(0.5, 0.5, 0.5, 0.0, 0.0),
            Err(WeightsError::BadSum(_))
        ));
        assert!(matches!(
            ComponentWeights::new(-0.1, 0.6, 0.2, 0.2, 0.1),
            Err(WeightsError::OutOfRange { name: "skills", .. })
        ));
        assert!(ComponentWeights::new(0.2, 0.2, 0.2, 0.2, 0.2).is_ok());
    }

    #[test]
    fn combine_matches_default_formula() {
        let total = DEFAULT_WEIGHTS.combine(1.0, 0.5, 0.0, 1.0, 0.2);
        let expected = 0.35 + 0.125 + 0.0 + 0.10 + 0.03;
        assert!((total - expected).abs() < 1e-9);
        assert_eq!(DEFAULT_WEIGHTS.combine(1.0, 1.0, 1.0, 1.0, 1.0), 1.0);
    }
}
