//! Linguistic variables and their discretized universes.

use crac_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};
use crate::membership::MembershipFunction;

/// Ordered, evenly sampled domain of a linguistic variable.
///
/// Deserialization goes through [`Universe::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UniverseBounds")]
pub struct Universe {
    min: f64,
    max: f64,
    step: f64,
}

#[derive(Deserialize)]
struct UniverseBounds {
    min: f64,
    max: f64,
    step: f64,
}

impl TryFrom<UniverseBounds> for Universe {
    type Error = FuzzyError;

    fn try_from(raw: UniverseBounds) -> FuzzyResult<Self> {
        Self::new(raw.min, raw.max, raw.step)
    }
}

impl Universe {
    /// Create a universe spanning `[min, max]` sampled every `step`.
    pub fn new(min: f64, max: f64, step: f64) -> FuzzyResult<Self> {
        ensure_finite(min, "universe min")?;
        ensure_finite(max, "universe max")?;
        ensure_finite(step, "universe step")?;
        if min >= max {
            return Err(FuzzyError::InvalidUniverse {
                what: "min must be less than max",
            });
        }
        if step <= 0.0 {
            return Err(FuzzyError::InvalidUniverse {
                what: "step must be positive",
            });
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of sample points, both bounds included.
    pub fn len(&self) -> usize {
        ((self.max - self.min) / self.step).round() as usize + 1
    }

    /// A universe always holds at least its two bounds.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sample points `min, min + step, ..., max`.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| (self.min + i as f64 * self.step).min(self.max))
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

/// A named input or output axis holding labelled fuzzy sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticVariable {
    name: String,
    universe: Universe,
    terms: Vec<(String, MembershipFunction)>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: Vec::new(),
        }
    }

    /// Register a labelled fuzzy set.
    ///
    /// # Errors
    ///
    /// Returns error if the label is already taken or the set's support
    /// extends beyond the universe.
    pub fn add_term(
        &mut self,
        label: impl Into<String>,
        membership: MembershipFunction,
    ) -> FuzzyResult<()> {
        let label = label.into();
        if self.term(&label).is_some() {
            return Err(FuzzyError::DuplicateLabel {
                variable: self.name.clone(),
                label,
            });
        }
        let (lo, hi) = membership.support();
        if !self.universe.contains(lo) || !self.universe.contains(hi) {
            return Err(FuzzyError::TermOutOfUniverse {
                variable: self.name.clone(),
                label,
            });
        }
        self.terms.push((label, membership));
        Ok(())
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(
        mut self,
        label: impl Into<String>,
        membership: MembershipFunction,
    ) -> FuzzyResult<Self> {
        self.add_term(label, membership)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn term(&self, label: &str) -> Option<&MembershipFunction> {
        self.terms.iter().find(|(l, _)| l == label).map(|(_, mf)| mf)
    }

    pub(crate) fn term_index(&self, label: &str) -> Option<usize> {
        self.terms.iter().position(|(l, _)| l == label)
    }

    pub(crate) fn term_at(&self, index: usize) -> &MembershipFunction {
        &self.terms[index].1
    }

    /// Labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(l, _)| l.as_str())
    }

    /// Degree of every label at `x`.
    pub fn fuzzify(&self, x: f64) -> Vec<(&str, f64)> {
        self.terms
            .iter()
            .map(|(l, mf)| (l.as_str(), mf.evaluate(x)))
            .collect()
    }

    /// Saturate a crisp value into this variable's universe.
    pub fn clamp(&self, x: f64) -> f64 {
        self.universe.clamp(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load() -> LinguisticVariable {
        LinguisticVariable::new("load", Universe::new(0.0, 100.0, 1.0).unwrap())
            .with_term(
                "low",
                MembershipFunction::trapezoidal(0.0, 0.0, 25.0, 40.0).unwrap(),
            )
            .unwrap()
            .with_term(
                "medium",
                MembershipFunction::triangular(30.0, 40.0, 70.0).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn universe_points_include_bounds() {
        let u = Universe::new(-16.0, 16.0, 0.5).unwrap();
        assert_eq!(u.len(), 65);
        let pts: Vec<f64> = u.points().collect();
        assert_eq!(pts[0], -16.0);
        assert_eq!(*pts.last().unwrap(), 16.0);
    }

    #[test]
    fn universe_fractional_step() {
        let u = Universe::new(0.0, 100.0, 0.2).unwrap();
        assert_eq!(u.len(), 501);
        assert!(u.points().all(|p| u.contains(p)));
    }

    #[test]
    fn invalid_universe() {
        assert!(Universe::new(1.0, 0.0, 0.1).is_err());
        assert!(Universe::new(0.0, 1.0, 0.0).is_err());
        assert!(Universe::new(0.0, f64::INFINITY, 0.1).is_err());
    }

    #[test]
    fn deserialized_universe_is_validated() {
        let u: Universe = serde_json::from_str(r#"{"min": 0.0, "max": 2.0, "step": 0.5}"#).unwrap();
        assert_eq!((u.min(), u.max(), u.step()), (0.0, 2.0, 0.5));
        assert_eq!(u.len(), 5);

        for bad in [
            r#"{"min": 0.0, "max": 100.0, "step": 0.0}"#,
            r#"{"min": 0.0, "max": 100.0, "step": -1.0}"#,
            r#"{"min": 5.0, "max": 5.0, "step": 1.0}"#,
        ] {
            let err = serde_json::from_str::<Universe>(bad).unwrap_err();
            assert!(err.to_string().contains("universe"), "{err}");
        }
    }

    #[test]
    fn deserialized_variable_rejects_zero_step() {
        let json = r#"{"name": "load", "universe": {"min": 0.0, "max": 100.0, "step": 0.0}, "terms": []}"#;
        assert!(serde_json::from_str::<LinguisticVariable>(json).is_err());
    }

    #[test]
    fn duplicate_label_rejected() {
        let err = load()
            .with_term("low", MembershipFunction::triangular(0.0, 1.0, 2.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, FuzzyError::DuplicateLabel { .. }));
    }

    #[test]
    fn term_outside_universe_rejected() {
        let err = load()
            .with_term(
                "overload",
                MembershipFunction::triangular(90.0, 110.0, 120.0).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, FuzzyError::TermOutOfUniverse { .. }));
    }

    #[test]
    fn fuzzify_reports_each_label() {
        let var = load();
        let degrees = var.fuzzify(40.0);
        assert_eq!(degrees, vec![("low", 0.0), ("medium", 1.0)]);
        assert_eq!(var.labels().collect::<Vec<_>>(), vec!["low", "medium"]);
    }

    #[test]
    fn clamp_to_universe() {
        let var = load();
        assert_eq!(var.clamp(130.0), 100.0);
        assert_eq!(var.clamp(-3.0), 0.0);
    }
}
