//! Linear expressions over [`Variable`]s — component A of the solver.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque handle minted from a process-wide monotonic counter. Two variables are equal iff
/// they were minted by the same call to [`Variable::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(u64);

impl Variable {
    pub fn new() -> Self {
        Self(NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn id(self) -> u64 {
        self.0
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl Sub for Variable {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_term(Term::new(self, 1.0)) - rhs
    }
}

/// A variable scaled by a coefficient. Negation flips the sign of the coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub variable: Variable,
    pub coefficient: f64,
}

impl Term {
    pub fn new(variable: Variable, coefficient: f64) -> Self {
        Self {
            variable,
            coefficient,
        }
    }

    pub fn negate(self) -> Self {
        Self {
            coefficient: -self.coefficient,
            ..self
        }
    }
}

/// A linear combination of variables plus a constant: `Σ cᵢ·vᵢ + k`.
///
/// Every arithmetic operation returns a fresh `Expression`; none mutate the receiver in a way
/// visible to the caller (`self` is consumed, not borrowed, so there is nothing left to alias).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub terms: Vec<Term>,
    pub constant: f64,
}

impl Expression {
    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    pub fn from_term(term: Term) -> Self {
        Self {
            terms: vec![term],
            constant: 0.0,
        }
    }

    pub fn new(constant: f64, terms: Vec<Term>) -> Self {
        Self { terms, constant }
    }

    pub fn negate(mut self) -> Self {
        self.constant = -self.constant;
        for term in &mut self.terms {
            *term = term.negate();
        }
        self
    }

    pub fn sub_constant(mut self, value: f64) -> Self {
        self.constant -= value;
        self
    }

    pub fn sub_variable(mut self, variable: Variable) -> Self {
        self.terms.push(Term::new(variable, -1.0));
        self
    }

    pub fn sub_expression(mut self, other: Expression) -> Self {
        let other = other.negate();
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }

    pub fn mul_constant(mut self, factor: f64) -> Self {
        self.constant *= factor;
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self
    }

    pub fn div_constant(self, divisor: f64) -> Self {
        self.mul_constant(1.0 / divisor)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(value: Variable) -> Self {
        Expression::from_term(Term::new(value, 1.0))
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        self.sub_constant(rhs)
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        self.sub_variable(rhs)
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        self.sub_expression(rhs)
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        self.mul_constant(rhs)
    }
}

impl Div<f64> for Expression {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        self.div_constant(rhs)
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: Expression) -> Expression {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

/// A strength is a positive priority used to weigh soft constraints in the solver's objective.
///
/// Named levels follow Cassowary convention; a constraint is "required" iff its strength is at
/// least [`Strength::REQUIRED`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Strength(pub f64);

impl Strength {
    pub const REQUIRED: Strength = Strength(1_001_001_000.0);
    pub const STRONG: Strength = Strength(1_000_000.0);
    pub const MEDIUM: Strength = Strength(1_000.0);
    pub const WEAK: Strength = Strength(1.0);

    pub fn is_required(self) -> bool {
        self.0 >= Self::REQUIRED.0
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Mul<f64> for Strength {
    type Output = Strength;

    fn mul(self, rhs: f64) -> Strength {
        Strength(self.0 * rhs)
    }
}

impl Div<f64> for Strength {
    type Output = Strength;

    fn div(self, rhs: f64) -> Strength {
        Strength(self.0 / rhs)
    }
}

impl Sub<f64> for Strength {
    type Output = Strength;

    fn sub(self, rhs: f64) -> Strength {
        Strength(self.0 - rhs)
    }
}

impl Add<f64> for Strength {
    type Output = Strength;

    fn add(self, rhs: f64) -> Strength {
        Strength(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_unique() {
        let a = Variable::new();
        let b = Variable::new();
        assert_ne!(a, b);
    }

    #[test]
    fn expression_arithmetic_does_not_mutate_in_place() {
        let v = Variable::new();
        let e1 = Expression::from_term(Term::new(v, 1.0));
        let e2 = e1.clone() - 5.0;
        assert_eq!(e1.constant, 0.0);
        assert_eq!(e2.constant, -5.0);
    }

    #[test]
    fn variable_sub_variable_builds_expression() {
        let a = Variable::new();
        let b = Variable::new();
        let e = a - b;
        assert_eq!(e.constant, 0.0);
        assert_eq!(e.terms.len(), 2);
        assert_eq!(e.terms[0], Term::new(a, 1.0));
        assert_eq!(e.terms[1], Term::new(b, -1.0));
    }

    #[test]
    fn strength_required_threshold() {
        assert!(Strength::REQUIRED.is_required());
        assert!(!(Strength::STRONG * 100.0).is_required());
        assert!((Strength::REQUIRED - 1.0).value() < Strength::REQUIRED.value());
    }
}
