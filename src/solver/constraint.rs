//! The solver-level `Constraint`: an expression, a relation, and a strength, identified by a
//! solver-minted id rather than by pointer identity (see the identity note in the crate's design
//! notes — a value type with an id sidesteps accidental deduplication of two structurally
//! identical constraints).

use std::sync::atomic::{AtomicU64, Ordering};

use super::variable::{Expression, Strength, Term, Variable};

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedRelation {
    pub relation: Relation,
    pub strength: Strength,
}

impl WeightedRelation {
    pub fn expr(self, expression: Expression) -> PartialConstraint {
        PartialConstraint {
            expression,
            relation: self,
        }
    }

    pub fn var(self, variable: Variable) -> PartialConstraint {
        self.expr(Expression::from(variable))
    }
}

pub fn eq(strength: Strength) -> WeightedRelation {
    WeightedRelation {
        relation: Relation::Eq,
        strength,
    }
}

pub fn le(strength: Strength) -> WeightedRelation {
    WeightedRelation {
        relation: Relation::Le,
        strength,
    }
}

pub fn ge(strength: Strength) -> WeightedRelation {
    WeightedRelation {
        relation: Relation::Ge,
        strength,
    }
}

/// The left-hand side of a constraint, waiting for a right-hand side.
pub struct PartialConstraint {
    expression: Expression,
    relation: WeightedRelation,
}

impl PartialConstraint {
    pub fn rhs_constant(self, value: f64) -> Constraint {
        Constraint::new(self.expression.sub_constant(value), self.relation)
    }

    pub fn rhs_expression(self, other: Expression) -> Constraint {
        Constraint::new(self.expression.sub_expression(other), self.relation)
    }

    pub fn rhs_variable(self, variable: Variable) -> Constraint {
        Constraint::new(self.expression.sub_variable(variable), self.relation)
    }
}

/// A single linear constraint: `expression relation 0`, weighted by `strength`.
///
/// Identity is by `id`, minted when the constraint is built — not by the structural contents of
/// `expression`/`relation`/`strength`. Two constraints built from identical inputs are still
/// distinct participants in the solver; `PartialEq`/`Hash` follow `id` accordingly so a
/// `Constraint` can key a `HashMap` the way the solver's tableau does.
#[derive(Debug, Clone)]
pub struct Constraint {
    id: u64,
    pub expression: Expression,
    pub relation: Relation,
    pub strength: Strength,
}

impl Constraint {
    fn new(expression: Expression, weighted: WeightedRelation) -> Self {
        Self {
            id: NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed),
            expression,
            relation: weighted.relation,
            strength: weighted.strength,
        }
    }

    /// Builds a constraint directly from its parts, still minting a fresh id.
    pub fn from_parts(expression: Expression, relation: Relation, strength: Strength) -> Self {
        Self {
            id: NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed),
            expression,
            relation,
            strength,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

impl std::hash::Hash for Constraint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Convenience constructor mirroring `Variable - Variable` style call sites: `a.minus(b)`.
pub fn term(variable: Variable, coefficient: f64) -> Term {
    Term::new(variable, coefficient)
}
