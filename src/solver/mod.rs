//! An incremental Cassowary simplex solver over prioritized linear equalities and inequalities.
//!
//! This is the crate's core: [`Solver`] owns a tableau of [`symbol::Row`]s indexed by basic
//! [`symbol::Symbol`], and maintains the usual Cassowary invariants (every non-basic symbol's row
//! expresses it in terms of other symbols; no external symbol is basic with a negative constant;
//! the objective has no negative coefficients for non-dummy symbols once `optimize` returns).
//!
//! A `Solver` is single-threaded and not safe for concurrent mutation; callers needing isolation
//! should create one `Solver` per computation, as [`crate::layout::Layout::split`] does.

mod constraint;
mod symbol;
mod variable;

pub use constraint::{eq, ge, le, Constraint, PartialConstraint, Relation, WeightedRelation};
pub use variable::{Expression, Strength, Term, Variable};

use std::collections::{HashMap, HashSet};

use self::symbol::{near_zero, Row, Symbol, SymbolKind, Tag};
use crate::error::SolverError;

/// A variable whose value changed since the previous [`Solver::fetch_changes`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub variable: Variable,
    pub value: f64,
}

struct VariableData {
    symbol: Symbol,
    constant: f64,
}

/// An incremental Cassowary constraint solver.
pub struct Solver {
    constraints: HashMap<u64, Tag>,
    var_data: HashMap<Variable, VariableData>,
    var_for_symbol: HashMap<Symbol, Variable>,
    changed: HashSet<Variable>,
    should_clear_changes: bool,
    rows: HashMap<Symbol, Row>,
    objective: Row,
    artificial: Option<Row>,
    next_symbol_id: u64,
    public_changes: Vec<Change>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            constraints: HashMap::new(),
            var_data: HashMap::new(),
            var_for_symbol: HashMap::new(),
            changed: HashSet::new(),
            should_clear_changes: false,
            rows: HashMap::new(),
            objective: Row::new(0.0),
            artificial: None,
            next_symbol_id: 1,
            public_changes: Vec::new(),
        }
    }

    /// Introduces one constraint into the tableau, re-optimizing the objective before returning.
    pub fn add(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        if self.constraints.contains_key(&constraint.id()) {
            return Err(SolverError::DuplicateConstraint);
        }

        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = choose_subject(&row, &tag);

        if subject.is_none() && row.is_all_dummy() {
            if !near_zero(row.constant) {
                return Err(SolverError::UnsatisfiableConstraint);
            }
            subject = Some(tag.marker);
        }

        match subject {
            None => {
                if !self.add_with_artificial_variable(row)? {
                    return Err(SolverError::UnsatisfiableConstraint);
                }
            }
            Some(subject) => {
                row.solve_for_symbol(subject);
                self.substitute(subject, &row);

                if subject.kind == SymbolKind::External && row.constant != 0.0 {
                    self.mark_symbol_changed(subject);
                }
                self.rows.insert(subject, row);
            }
        }

        self.constraints.insert(constraint.id(), tag);
        self.optimize(false)?;

        Ok(())
    }

    /// Adds each constraint in order, stopping at the first error.
    pub fn add_many(
        &mut self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<(), SolverError> {
        for constraint in constraints {
            self.add(constraint)?;
        }
        Ok(())
    }

    /// The current value of `variable`, or 0 if it is not yet known to the solver.
    pub fn value(&self, variable: Variable) -> f64 {
        self.var_data
            .get(&variable)
            .and_then(|data| self.rows.get(&data.symbol))
            .map(|row| row.constant)
            .unwrap_or(0.0)
    }

    /// Returns the variables whose value changed since the previous call, in unspecified order.
    pub fn fetch_changes(&mut self) -> &[Change] {
        if self.should_clear_changes {
            self.changed.clear();
            self.should_clear_changes = false;
        } else {
            self.should_clear_changes = true;
        }

        self.public_changes.clear();

        let dirty: Vec<Variable> = self.changed.iter().copied().collect();
        for variable in dirty {
            let Some(data) = self.var_data.get(&variable) else {
                continue;
            };
            let new_value = self
                .rows
                .get(&data.symbol)
                .map(|row| row.constant)
                .unwrap_or(0.0);

            if data.constant != new_value {
                self.public_changes.push(Change {
                    variable,
                    value: new_value,
                });
                self.var_data.get_mut(&variable).unwrap().constant = new_value;
            }
        }

        &self.public_changes
    }

    /// Empties the solver, releasing every row, constraint, and variable mapping it holds.
    pub fn reset(&mut self) {
        self.constraints.clear();
        self.var_data.clear();
        self.var_for_symbol.clear();
        self.changed.clear();
        self.should_clear_changes = false;
        self.rows.clear();
        self.objective = Row::new(0.0);
        self.artificial = None;
        self.next_symbol_id = 1;
        self.public_changes.clear();
    }

    fn mark_symbol_changed(&mut self, symbol: Symbol) {
        if let Some(&variable) = self.var_for_symbol.get(&symbol) {
            if self.should_clear_changes {
                self.changed.clear();
                self.should_clear_changes = false;
            }
            self.changed.insert(variable);
        }
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        Symbol::new(id, kind)
    }

    fn get_var_symbol(&mut self, variable: Variable) -> Symbol {
        if let Some(data) = self.var_data.get(&variable) {
            return data.symbol;
        }
        let symbol = self.new_symbol(SymbolKind::External);
        self.var_for_symbol.insert(symbol, variable);
        self.var_data.insert(
            variable,
            VariableData {
                symbol,
                constant: f64::NAN,
            },
        );
        symbol
    }

    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let expr = &constraint.expression;
        let mut row = Row::new(expr.constant);

        for term in &expr.terms {
            if near_zero(term.coefficient) {
                continue;
            }
            let symbol = self.get_var_symbol(term.variable);
            match self.rows.get(&symbol) {
                Some(existing) => {
                    let existing = existing.clone();
                    row.insert_row(&existing, term.coefficient);
                }
                None => row.insert_symbol(symbol, term.coefficient),
            }
        }

        let tag = match constraint.relation {
            Relation::Le | Relation::Ge => {
                let coeff = if constraint.relation == Relation::Le {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.new_symbol(SymbolKind::Slack);
                row.insert_symbol(slack, coeff);

                if constraint.strength.is_required() {
                    Tag {
                        marker: slack,
                        other: None,
                    }
                } else {
                    let error = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(error, -coeff);
                    self.objective.insert_symbol(error, constraint.strength.value());
                    Tag {
                        marker: slack,
                        other: Some(error),
                    }
                }
            }
            Relation::Eq => {
                if constraint.strength.is_required() {
                    let dummy = self.new_symbol(SymbolKind::Dummy);
                    row.insert_symbol(dummy, 1.0);
                    Tag {
                        marker: dummy,
                        other: None,
                    }
                } else {
                    let error_plus = self.new_symbol(SymbolKind::Error);
                    let error_minus = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(error_plus, -1.0);
                    row.insert_symbol(error_minus, 1.0);
                    self.objective
                        .insert_symbol(error_plus, constraint.strength.value());
                    self.objective
                        .insert_symbol(error_minus, constraint.strength.value());
                    Tag {
                        marker: error_plus,
                        other: Some(error_minus),
                    }
                }
            }
        };

        if row.constant < 0.0 {
            row.reverse_sign();
        }

        (row, tag)
    }

    fn add_with_artificial_variable(&mut self, row: Row) -> Result<bool, SolverError> {
        let art = self.new_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row);

        self.optimize(true)?;

        let success = near_zero(
            self.artificial
                .as_ref()
                .expect("artificial row present during its own optimization")
                .constant,
        );
        self.artificial = None;

        if let Some(mut art_row) = self.rows.remove(&art) {
            if art_row.cells.is_empty() {
                return Ok(success);
            }

            let entering = match art_row.any_pivotable_symbol() {
                Some(symbol) => symbol,
                None => return Ok(false),
            };

            art_row.solve_for_symbols(art, entering);
            self.substitute(entering, &art_row);
            self.rows.insert(entering, art_row);
        }

        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);

        Ok(success)
    }

    /// Runs the simplex loop against either the real objective or, during an artificial-variable
    /// insertion, the artificial row — both live in `self` so every pivot's `substitute` call
    /// updates whichever one is active alongside every tableau row, without needing to thread a
    /// borrowed reference to it through the loop.
    fn optimize(&mut self, artificial: bool) -> Result<(), SolverError> {
        loop {
            let entering = if artificial {
                get_entering_symbol(
                    self.artificial
                        .as_ref()
                        .expect("optimize(artificial=true) requires an artificial row"),
                )
            } else {
                get_entering_symbol(&self.objective)
            };

            let Some(entering) = entering else {
                return Ok(());
            };

            let Some((leaving, mut row)) = self.get_leaving_row(entering) else {
                return Err(SolverError::Internal("unbounded objective".to_string()));
            };

            row.solve_for_symbols(leaving, entering);
            self.substitute(entering, &row);

            if entering.kind == SymbolKind::External && row.constant != 0.0 {
                self.mark_symbol_changed(entering);
            }

            self.rows.insert(entering, row);
        }
    }

    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        let affected: Vec<Symbol> = self.rows.keys().copied().collect();
        for other_symbol in affected {
            let mut other_row = self.rows.remove(&other_symbol).unwrap();
            let constant_changed = other_row.substitute(symbol, row);

            if other_symbol.kind == SymbolKind::External && constant_changed {
                self.mark_symbol_changed(other_symbol);
            }

            self.rows.insert(other_symbol, other_row);
        }

        self.objective.substitute(symbol, row);

        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row);
        }
    }

    fn get_leaving_row(&mut self, entering: Symbol) -> Option<(Symbol, Row)> {
        let mut candidates: Vec<Symbol> = self.rows.keys().copied().collect();
        candidates.sort();

        let mut best_ratio = f64::INFINITY;
        let mut found: Option<Symbol> = None;

        for symbol in candidates {
            if symbol.kind == SymbolKind::External {
                continue;
            }
            let coeff = self.rows[&symbol].coefficient_for(entering);
            if coeff < 0.0 {
                let ratio = -self.rows[&symbol].constant / coeff;
                if ratio < best_ratio {
                    best_ratio = ratio;
                    found = Some(symbol);
                }
            }
        }

        let found = found?;
        self.rows.remove(&found).map(|row| (found, row))
    }
}

/// Picks the symbol that will become basic for a freshly-added row: any external symbol already
/// present (lowest id, for determinism), else a Slack/Error from the constraint's own tag with a
/// negative coefficient, else `None` (the row needs an artificial variable).
fn choose_subject(row: &Row, tag: &Tag) -> Option<Symbol> {
    if let Some(external) = row
        .cells
        .keys()
        .filter(|s| s.kind == SymbolKind::External)
        .min()
        .copied()
    {
        return Some(external);
    }

    for candidate in [Some(tag.marker), tag.other].into_iter().flatten() {
        if matches!(candidate.kind, SymbolKind::Slack | SymbolKind::Error)
            && row.coefficient_for(candidate) < 0.0
        {
            return Some(candidate);
        }
    }

    None
}

/// The lowest-id non-dummy symbol with a negative coefficient in `objective`, deterministically.
fn get_entering_symbol(objective: &Row) -> Option<Symbol> {
    objective
        .cells
        .iter()
        .filter(|(s, &v)| s.kind != SymbolKind::Dummy && v < 0.0)
        .map(|(&s, _)| s)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_value(solver: &Solver, v: Variable) -> f64 {
        solver.value(v)
    }

    #[test]
    fn solves_simple_equality() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(5.0))
            .unwrap();
        assert_eq!(var_value(&solver, x), 5.0);
    }

    #[test]
    fn solves_inequality_chain() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let y = Variable::new();
        solver
            .add(ge(Strength::REQUIRED).var(x).rhs_constant(0.0))
            .unwrap();
        solver
            .add(le(Strength::REQUIRED).var(x).rhs_variable(y))
            .unwrap();
        solver
            .add(eq(Strength::REQUIRED).var(y).rhs_constant(10.0))
            .unwrap();
        solver
            .add(eq(Strength::STRONG).var(x).rhs_constant(3.0))
            .unwrap();
        assert_eq!(var_value(&solver, x), 3.0);
        assert_eq!(var_value(&solver, y), 10.0);
    }

    #[test]
    fn soft_constraint_yields_when_infeasible_with_hard_bound() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add(le(Strength::REQUIRED).var(x).rhs_constant(5.0))
            .unwrap();
        // asking for more than the hard upper bound, at a weaker strength: solver clamps to 5.
        solver
            .add(eq(Strength::STRONG).var(x).rhs_constant(10.0))
            .unwrap();
        assert_eq!(var_value(&solver, x), 5.0);
    }

    #[test]
    fn duplicate_constraint_rejected() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let c = eq(Strength::REQUIRED).var(x).rhs_constant(1.0);
        solver.add(c.clone()).unwrap();
        let err = solver.add(c).unwrap_err();
        assert_eq!(err, SolverError::DuplicateConstraint);
    }

    #[test]
    fn unsatisfiable_required_constraints_rejected() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(1.0))
            .unwrap();
        let err = solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(2.0))
            .unwrap_err();
        assert_eq!(err, SolverError::UnsatisfiableConstraint);
    }

    #[test]
    fn fetch_changes_reports_only_deltas_between_calls() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(4.0))
            .unwrap();
        let first = solver.fetch_changes().to_vec();
        assert_eq!(first, vec![Change { variable: x, value: 4.0 }]);

        let second = solver.fetch_changes().to_vec();
        assert!(second.is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(4.0))
            .unwrap();
        solver.reset();
        assert_eq!(solver.value(x), 0.0);
        // a fresh (newly minted) constraint is accepted right after a reset.
        solver
            .add(eq(Strength::REQUIRED).var(x).rhs_constant(9.0))
            .unwrap();
        assert_eq!(solver.value(x), 9.0);
    }

    #[test]
    fn two_fill_like_weak_proportional_constraints() {
        // mirrors the compiler's Fill/Min proportional pairing at a smaller scale: two
        // variables forced into a 2:1 ratio by a single equality constraint.
        let mut solver = Solver::new();
        let a = Variable::new();
        let b = Variable::new();
        solver
            .add(ge(Strength::REQUIRED).var(a).rhs_constant(0.0))
            .unwrap();
        solver
            .add(eq(Strength::REQUIRED).var(a).rhs_variable(b))
            .unwrap();
        // a == b, then further equality should keep them tied.
        solver
            .add(eq(Strength::STRONG).var(a).rhs_constant(7.0))
            .unwrap();
        assert_eq!(solver.value(a), 7.0);
        assert_eq!(solver.value(b), 7.0);
    }
}
