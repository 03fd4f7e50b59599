//! Mamdani inference engine.
//!
//! Evaluation pipeline for one call:
//! 1. Fuzzify every antecedent term at the supplied crisp input
//! 2. Fire each rule with the minimum of its antecedent degrees
//! 3. Clip the consequent set at the firing strength
//! 4. Aggregate all shaped sets by pointwise maximum
//! 5. Defuzzify the aggregate by centroid over the output universe
//!
//! If no rule fires the aggregate is empty and the centroid is undefined;
//! [`InferenceEngine::evaluate`] returns `Ok(None)` and the caller picks a
//! fallback.

use crac_core::ensure_finite;

use crate::error::{FuzzyError, FuzzyResult};
use crate::rule::Rule;
use crate::variable::LinguisticVariable;

/// Aggregated output fuzzy set sampled on the output universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    points: Vec<f64>,
    degrees: Vec<f64>,
}

impl Aggregation {
    fn new(points: Vec<f64>) -> Self {
        let degrees = vec![0.0; points.len()];
        Self { points, degrees }
    }

    /// Zero every degree, keeping the sample points.
    pub fn clear(&mut self) {
        self.degrees.iter_mut().for_each(|d| *d = 0.0);
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Total membership mass; zero means no rule fired.
    pub fn mass(&self) -> f64 {
        self.degrees.iter().sum()
    }

    /// Centroid `sum(x * mu) / sum(mu)`, or `None` for an empty set.
    pub fn centroid(&self) -> Option<f64> {
        let mass = self.mass();
        if mass <= 0.0 {
            return None;
        }
        let moment: f64 = self
            .points
            .iter()
            .zip(&self.degrees)
            .map(|(x, mu)| x * mu)
            .sum();
        Some(moment / mass)
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    /// `(input variable index, term index)` per antecedent term.
    antecedent: Vec<(usize, usize)>,
    /// Output term index.
    consequent: usize,
}

/// A validated rule base over a set of input variables and one output.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<CompiledRule>,
    points: Vec<f64>,
    /// Output term memberships sampled on `points`, indexed by term.
    consequent_samples: Vec<Vec<f64>>,
}

impl InferenceEngine {
    /// Build an engine, resolving every rule term against the variables.
    ///
    /// # Errors
    ///
    /// Returns error if variable names collide, the rule base is empty, or a
    /// rule references an unknown variable or label.
    pub fn new(
        inputs: Vec<LinguisticVariable>,
        output: LinguisticVariable,
        rules: Vec<Rule>,
    ) -> FuzzyResult<Self> {
        for (i, var) in inputs.iter().enumerate() {
            let clash = inputs[..i].iter().any(|v| v.name() == var.name())
                || var.name() == output.name();
            if clash {
                return Err(FuzzyError::DuplicateVariable {
                    name: var.name().to_string(),
                });
            }
        }
        if rules.is_empty() {
            return Err(FuzzyError::EmptyRuleBase);
        }

        let compiled = rules
            .iter()
            .map(|rule| compile_rule(rule, &inputs, &output))
            .collect::<FuzzyResult<Vec<_>>>()?;

        let points: Vec<f64> = output.universe().points().collect();
        let consequent_samples = output
            .labels()
            .map(|label| {
                let mf = output.term(label).copied();
                points
                    .iter()
                    .map(|&x| mf.map_or(0.0, |mf| mf.evaluate(x)))
                    .collect()
            })
            .collect();

        Ok(Self {
            inputs,
            output,
            rules: compiled,
            points,
            consequent_samples,
        })
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.iter().find(|v| v.name() == name)
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// An empty aggregation buffer sized for this engine's output universe.
    pub fn aggregation(&self) -> Aggregation {
        Aggregation::new(self.points.clone())
    }

    /// Firing strength of every rule, in rule-base order.
    pub fn firing_strengths(&self, inputs: &[(&str, f64)]) -> FuzzyResult<Vec<f64>> {
        let crisp = self.resolve_inputs(inputs)?;
        Ok(self.rules.iter().map(|r| self.strength(r, &crisp)).collect())
    }

    /// Infer the crisp output for `inputs`.
    ///
    /// Returns `Ok(None)` when no rule fires.
    pub fn evaluate(&self, inputs: &[(&str, f64)]) -> FuzzyResult<Option<f64>> {
        let mut aggregation = self.aggregation();
        self.evaluate_into(inputs, &mut aggregation)
    }

    /// Like [`evaluate`](Self::evaluate), reusing a caller-owned buffer.
    ///
    /// The buffer is cleared before accumulation, so nothing from a previous
    /// call leaks into this one.
    pub fn evaluate_into(
        &self,
        inputs: &[(&str, f64)],
        aggregation: &mut Aggregation,
    ) -> FuzzyResult<Option<f64>> {
        let crisp = self.resolve_inputs(inputs)?;
        if aggregation.points.len() != self.points.len() {
            *aggregation = self.aggregation();
        }
        aggregation.clear();

        for rule in &self.rules {
            let strength = self.strength(rule, &crisp);
            if strength <= 0.0 {
                continue;
            }
            let samples = &self.consequent_samples[rule.consequent];
            for (agg, &mu) in aggregation.degrees.iter_mut().zip(samples) {
                *agg = agg.max(mu.min(strength));
            }
        }

        Ok(aggregation
            .centroid()
            .map(|c| self.output.universe().clamp(c)))
    }

    fn strength(&self, rule: &CompiledRule, crisp: &[f64]) -> f64 {
        rule.antecedent
            .iter()
            .map(|&(var, term)| self.inputs[var].term_at(term).evaluate(crisp[var]))
            .fold(1.0, f64::min)
    }

    /// Order crisp values by input variable index.
    fn resolve_inputs(&self, inputs: &[(&str, f64)]) -> FuzzyResult<Vec<f64>> {
        let mut crisp: Vec<Option<f64>> = vec![None; self.inputs.len()];
        for &(name, value) in inputs {
            let idx = self
                .inputs
                .iter()
                .position(|v| v.name() == name)
                .ok_or_else(|| FuzzyError::UnknownInput {
                    name: name.to_string(),
                })?;
            crisp[idx] = Some(ensure_finite(value, "crisp input")?);
        }
        crisp
            .into_iter()
            .zip(&self.inputs)
            .map(|(v, var)| {
                v.ok_or_else(|| FuzzyError::MissingInput {
                    name: var.name().to_string(),
                })
            })
            .collect()
    }
}

fn compile_rule(
    rule: &Rule,
    inputs: &[LinguisticVariable],
    output: &LinguisticVariable,
) -> FuzzyResult<CompiledRule> {
    if rule.antecedent.is_empty() {
        return Err(FuzzyError::EmptyAntecedent);
    }
    let antecedent = rule
        .antecedent
        .iter()
        .map(|term| {
            let var = inputs
                .iter()
                .position(|v| v.name() == term.variable)
                .ok_or_else(|| FuzzyError::UnknownVariable {
                    name: term.variable.clone(),
                })?;
            let label = inputs[var].term_index(&term.label).ok_or_else(|| {
                FuzzyError::UnknownLabel {
                    variable: term.variable.clone(),
                    label: term.label.clone(),
                }
            })?;
            Ok((var, label))
        })
        .collect::<FuzzyResult<Vec<_>>>()?;

    if rule.consequent.variable != output.name() {
        return Err(FuzzyError::UnknownVariable {
            name: rule.consequent.variable.clone(),
        });
    }
    let consequent =
        output
            .term_index(&rule.consequent.label)
            .ok_or_else(|| FuzzyError::UnknownLabel {
                variable: rule.consequent.variable.clone(),
                label: rule.consequent.label.clone(),
            })?;

    Ok(CompiledRule {
        antecedent,
        consequent,
    })
}
