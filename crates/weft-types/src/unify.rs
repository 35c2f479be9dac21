//! Unification of a producer's declared type against a requested type.
//!
//! Producers (`<S extends Score2> ScoreManager2<S> make()`) expose a single
//! declared type that may carry their own type variables. Resolution walks
//! the required type and the declared type in lock-step, binding each
//! producer variable to the corresponding fragment of the required type, and
//! then verifies the declared bounds against the bound values.

use std::collections::{HashMap, HashSet};

use crate::assign::{argument_matches, covariant, matches_with};
use crate::closure::substitute_bindings;
use crate::{TypeExpr, TypeUniverse, VarId};

/// Variable bindings produced by a successful unification.
pub type Bindings = HashMap<VarId, TypeExpr>;

/// Unify `required` against a producer's `declared` type.
///
/// `producer_vars` are the variables the producer itself declares; only those
/// are bindable, and each binds at most once (a later occurrence must be
/// structurally equal to the bound value, otherwise the candidate is simply
/// disqualified). Ground declared fragments fall back to the plain
/// assignability rules, so a required wildcard still matches covariantly.
///
/// Returns the bindings on success, `None` on any mismatch. A producer with
/// no variables reduces to structural assignability.
pub fn unify_producer(
    universe: &TypeUniverse,
    required: &TypeExpr,
    declared: &TypeExpr,
    producer_vars: &[VarId],
) -> Option<Bindings> {
    let vars: HashSet<VarId> = producer_vars.iter().copied().collect();
    let mut bindings = Bindings::new();
    if !walk(universe, required, declared, &vars, &mut bindings) {
        return None;
    }

    // Bound verification happens after the walk settles, with the bindings
    // substituted into each bound first. A self-referential bound like
    // `S extends Score3<S>` therefore checks the tentative binding against
    // e.g. `Score3<MyScore3>` instead of chasing the variable again; if the
    // re-check contradicts the binding, the candidate is disqualified.
    let mut guard = HashSet::new();
    for var in producer_vars {
        let Some(value) = bindings.get(var).cloned() else {
            // A variable the declared type never mentions imposes nothing.
            continue;
        };
        for bound in &universe.type_param(*var).upper_bounds {
            let bound = substitute_bindings(bound, &bindings);
            if !covariant(universe, &value, &bound, &mut bindings, &mut guard) {
                return None;
            }
        }
    }

    Some(bindings)
}

fn walk(
    u: &TypeUniverse,
    required: &TypeExpr,
    declared: &TypeExpr,
    vars: &HashSet<VarId>,
    bindings: &mut Bindings,
) -> bool {
    if let TypeExpr::Var(var) = declared {
        if vars.contains(var) {
            return bind(*var, required, bindings);
        }
    }
    match (required, declared) {
        (
            TypeExpr::Class { def: rd, args: ra },
            TypeExpr::Class { def: cd, args: ca },
        ) => {
            if rd != cd {
                return false;
            }
            if ra.is_empty() && !ca.is_empty() {
                return true;
            }
            if ra.len() != ca.len() {
                return false;
            }
            ra.iter()
                .zip(ca.iter())
                .all(|(r, c)| walk_argument(u, r, c, vars, bindings))
        }
        (TypeExpr::Array(re), TypeExpr::Array(ce)) => walk(u, re, ce, vars, bindings),
        _ => required == declared,
    }
}

fn walk_argument(
    u: &TypeUniverse,
    required: &TypeExpr,
    declared: &TypeExpr,
    vars: &HashSet<VarId>,
    bindings: &mut Bindings,
) -> bool {
    if let TypeExpr::Var(var) = declared {
        if vars.contains(var) {
            return bind(*var, required, bindings);
        }
    }
    match (required, declared) {
        (TypeExpr::Wildcard(_), _) => {
            // Declared side is ground here; apply the wildcard rules as-is.
            let mut guard = HashSet::new();
            argument_matches(u, required, declared, bindings, &mut guard)
        }
        (TypeExpr::Class { .. }, TypeExpr::Class { .. })
        | (TypeExpr::Array(_), TypeExpr::Array(_)) => walk(u, required, declared, vars, bindings),
        _ => {
            let mut guard = HashSet::new();
            matches_with(u, required, declared, bindings, &mut guard)
        }
    }
}

fn bind(var: VarId, value: &TypeExpr, bindings: &mut Bindings) -> bool {
    match bindings.get(&var) {
        Some(existing) => existing == value,
        None => {
            bindings.insert(var, value.clone());
            true
        }
    }
}
