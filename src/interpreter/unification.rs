// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! A constraint batch ("unification scope"), grounded on
//! `examples/original_source/src/typing/UnificationScope.{h,cpp}`.
//!
//! A constraint operand is usually already type-valued (an `AbstractValue`
//! pointing at a `Type` cell), since the generator typically lowers a
//! `Unify` site behind a `GetTypeForValue`/`NewValue` pair first. But an
//! operand can still be carrying an unresolved hole at the time it is
//! enqueued, so `solve` partially evaluates both sides in the constraint's
//! environment before demanding a `Type` out of them, per
//! `examples/original_source/src/typing/PartialEvaluator.cpp`.

use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::environment::GcEnvironmentRef;
use crate::heap::{CellRef, GcRef, Heap};
use crate::hole::partially_evaluate;
use crate::types::substitution::Substitution;
use crate::types::{equality::types_equal, Type};
use crate::value::Value;
use std::collections::VecDeque;

/// Unwraps an `AbstractValue`'s payload as a `Type` ref; `None` if the cell
/// it wraps isn't a `Type` (a malformed constraint operand).
fn as_type_ref(cell: CellRef) -> Option<GcRef<Type>> {
    match cell {
        CellRef::Type(r) => Some(r),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub lhs: Value,
    pub rhs: Value,
}

#[derive(Debug)]
pub struct UnificationScope {
    constraints: VecDeque<Constraint>,
    inferred: VecDeque<u32>,
    substitution: Substitution,
    finalized: bool,
}

impl UnificationScope {
    pub fn new() -> Self {
        UnificationScope {
            constraints: VecDeque::new(),
            inferred: VecDeque::new(),
            substitution: Substitution::new(),
            finalized: false,
        }
    }

    /// *On unify*: enqueues, or fails if the scope already finalized.
    pub fn enqueue(&mut self, constraint: Constraint) {
        debug_assert!(!self.finalized, "unify on a finalized UnificationScope");
        self.constraints.push_back(constraint);
    }

    pub fn infer(&mut self, uid: u32) {
        self.inferred.push_back(uid);
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Every value this scope is still holding onto: both operands of each
    /// pending constraint, plus whatever `Type`s the substitution has
    /// already bound. Used to root a collection that runs mid-`resolve`,
    /// before the substitution has been handed back to the caller.
    pub fn roots(&self) -> Vec<Value> {
        let mut roots = Vec::with_capacity(self.constraints.len() * 2 + self.substitution.bound_types().count());
        for constraint in &self.constraints {
            roots.push(constraint.lhs);
            roots.push(constraint.rhs);
        }
        for ty in self.substitution.bound_types() {
            roots.push(Value::abstract_value(CellRef::Type(ty)));
        }
        roots
    }

    /// *On resolve*: finalizes, drains and solves constraints in FIFO order,
    /// checks every inferred variable got bound, and reports into
    /// `diagnostics`. Returns `Err(())` iff any diagnostic was recorded.
    /// `stack` roots any collection a constraint's allocations might
    /// trigger; it should cover every value still live outside this scope.
    pub fn resolve(
        mut self,
        heap: &mut Heap,
        diagnostics: &mut Diagnostics,
        location: SourceLocation,
        env: GcEnvironmentRef,
        stack: &[Value],
    ) -> Result<Substitution, ()> {
        self.finalized = true;
        while let Some(constraint) = self.constraints.pop_front() {
            let mut combined = self.roots();
            combined.extend_from_slice(stack);
            self.solve(heap, diagnostics, &location, env, &combined, constraint);
        }
        for uid in &self.inferred {
            if self.substitution.get(*uid).is_none() {
                diagnostics.push(location.clone(), format!("failed to infer type variable {}", uid));
            }
        }
        if diagnostics.is_empty() {
            Ok(self.substitution)
        } else {
            Err(())
        }
    }

    fn solve(
        &mut self,
        heap: &mut Heap,
        diagnostics: &mut Diagnostics,
        location: &SourceLocation,
        env: GcEnvironmentRef,
        stack: &[Value],
        constraint: Constraint,
    ) {
        let lhs_evaluated = partially_evaluate(heap, constraint.lhs, env);
        let rhs_evaluated = partially_evaluate(heap, constraint.rhs, env);
        let (lhs_ty, rhs_ty) = match (
            lhs_evaluated.as_abstract_type().and_then(as_type_ref),
            rhs_evaluated.as_abstract_type().and_then(as_type_ref),
        ) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                diagnostics.push(location.clone(), "constraint operand is not a type".to_string());
                return;
            }
        };
        let rhs_resolved = match self.substitution.apply(heap, rhs_ty, stack) {
            Ok(r) => r,
            Err(_) => return,
        };

        if let Type::Var(v) = heap.get_type(rhs_resolved).clone() {
            if !v.rigid {
                let applied_lhs = match self.substitution.apply(heap, lhs_ty, stack) {
                    Ok(r) => r,
                    Err(_) => return,
                };
                self.substitution.bind(v.uid, applied_lhs);
                return;
            }
        }

        let lhs_resolved = match self.substitution.apply(heap, lhs_ty, stack) {
            Ok(r) => r,
            Err(_) => return,
        };

        if types_equal(heap, lhs_resolved, rhs_resolved) {
            return;
        }

        if matches!(heap.get_type(rhs_resolved), Type::Var(_)) {
            diagnostics.push(
                location.clone(),
                format!("expected a type but found `{}`", heap.get_type(lhs_resolved).display(heap)),
            );
            return;
        }

        diagnostics.push(
            location.clone(),
            format!(
                "expected `{}` but found `{}`",
                heap.get_type(rhs_resolved).display(heap),
                heap.get_type(lhs_resolved).display(heap)
            ),
        );
    }
}

/// Partially evaluates both sides of a would-be constraint operand before it
/// is enqueued.
pub fn partially_evaluate_operand(heap: &mut Heap, v: Value, env: GcEnvironmentRef) -> Value {
    partially_evaluate(heap, v, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::GcEnvironment;
    use crate::value::Value;

    fn name_type(heap: &mut Heap, name: &str) -> GcRef<Type> {
        heap.allocate_type(Type::Name(name.into()), &[]).unwrap()
    }

    fn empty_env(heap: &mut Heap) -> GcEnvironmentRef {
        heap.allocate_environment(GcEnvironment::new(None), &[]).unwrap()
    }

    #[test]
    fn equal_names_solve_without_diagnostics() {
        let mut heap = Heap::new(false);
        let number = name_type(&mut heap, "Number");
        let env = empty_env(&mut heap);
        let mut scope = UnificationScope::new();
        scope.enqueue(Constraint { lhs: Value::abstract_value(CellRef::Type(number)), rhs: Value::abstract_value(CellRef::Type(number)) });
        let mut diagnostics = Diagnostics::new();
        let result = scope.resolve(&mut heap, &mut diagnostics, SourceLocation::synthetic(), env, &[]);
        assert!(result.is_ok());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn mismatched_names_report_a_diagnostic() {
        let mut heap = Heap::new(false);
        let number = name_type(&mut heap, "Number");
        let string = name_type(&mut heap, "String");
        let env = empty_env(&mut heap);
        let mut scope = UnificationScope::new();
        scope.enqueue(Constraint { lhs: Value::abstract_value(CellRef::Type(number)), rhs: Value::abstract_value(CellRef::Type(string)) });
        let mut diagnostics = Diagnostics::new();
        let result = scope.resolve(&mut heap, &mut diagnostics, SourceLocation::synthetic(), env, &[]);
        assert!(result.is_err());
        assert_eq!(diagnostics.errors().len(), 1);
    }

    #[test]
    fn free_var_on_the_right_binds_to_the_left_type() {
        let mut heap = Heap::new(false);
        let number = name_type(&mut heap, "Number");
        let var = heap.allocate_type(Type::Var(crate::types::TypeVar { uid: 1, display_name: "T".into(), rigid: false }), &[]).unwrap();
        let env = empty_env(&mut heap);
        let mut scope = UnificationScope::new();
        scope.enqueue(Constraint { lhs: Value::abstract_value(CellRef::Type(number)), rhs: Value::abstract_value(CellRef::Type(var)) });
        let mut diagnostics = Diagnostics::new();
        let subst = scope.resolve(&mut heap, &mut diagnostics, SourceLocation::synthetic(), env, &[]).unwrap();
        assert_eq!(subst.get(1), Some(number));
    }

    #[test]
    fn unresolved_inferred_variable_is_a_hard_error() {
        let mut heap = Heap::new(false);
        let env = empty_env(&mut heap);
        let mut scope = UnificationScope::new();
        scope.infer(7);
        let mut diagnostics = Diagnostics::new();
        let result = scope.resolve(&mut heap, &mut diagnostics, SourceLocation::synthetic(), env, &[]);
        assert!(result.is_err());
        assert!(diagnostics.errors()[0].message.contains("failed to infer"));
    }
}
