//! Ordered, short-circuit rule evaluation.
//!
//! A `RuleSet` is a priority list of `(label, predicate)` pairs plus a
//! fallback label. Evaluation returns the label of the first predicate that
//! matches; later predicates are never called for that input. The priority
//! order is data, so it can be listed and asserted on in tests.

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Rule<T, L> {
    label: L,
    predicate: Predicate<T>,
}

pub struct RuleSet<T, L> {
    rules: Vec<Rule<T, L>>,
    fallback: L,
}

impl<T, L: Copy> RuleSet<T, L> {
    /// Start an empty rule set that yields `fallback` when nothing matches.
    pub fn new(fallback: L) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule at the lowest priority so far.
    pub fn rule<F>(mut self, label: L, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            label,
            predicate: Box::new(predicate),
        });
        self
    }

    /// Label of the first matching rule, or the fallback.
    pub fn evaluate(&self, input: &T) -> L {
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(input))
            .map(|rule| rule.label)
            .unwrap_or(self.fallback)
    }

    /// Labels in evaluation order, fallback last.
    pub fn priority_order(&self) -> Vec<L> {
        self.rules
            .iter()
            .map(|rule| rule.label)
            .chain(std::iter::once(self.fallback))
            .collect()
    }
}
