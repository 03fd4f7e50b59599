//! Fuzzy rules: `IF a is X AND b is Y THEN out is Z`.

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// A `(variable, label)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub variable: String,
    pub label: String,
}

impl Term {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
        }
    }
}

/// A conjunctive rule with a single consequent.
///
/// The consequent set is clipped at the rule's firing strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: Vec<Term>,
    pub consequent: Term,
}

impl Rule {
    /// Create a rule from explicit terms.
    ///
    /// # Errors
    ///
    /// Returns error if the antecedent is empty.
    pub fn new(antecedent: Vec<Term>, consequent: Term) -> FuzzyResult<Self> {
        if antecedent.is_empty() {
            return Err(FuzzyError::EmptyAntecedent);
        }
        Ok(Self {
            antecedent,
            consequent,
        })
    }

    /// Start a rule with its first antecedent term.
    ///
    /// ```
    /// use crac_fuzzy::Rule;
    ///
    /// let rule = Rule::when("error", "ZE")
    ///     .and("delta_error", "ZE")
    ///     .then("base_power", "M");
    /// assert_eq!(rule.antecedent.len(), 2);
    /// ```
    pub fn when(variable: impl Into<String>, label: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            antecedent: vec![Term::new(variable, label)],
        }
    }
}

/// Incremental rule construction; see [`Rule::when`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    antecedent: Vec<Term>,
}

impl RuleBuilder {
    pub fn and(mut self, variable: impl Into<String>, label: impl Into<String>) -> Self {
        self.antecedent.push(Term::new(variable, label));
        self
    }

    pub fn then(self, variable: impl Into<String>, label: impl Into<String>) -> Rule {
        Rule {
            antecedent: self.antecedent,
            consequent: Term::new(variable, label),
        }
    }
}
