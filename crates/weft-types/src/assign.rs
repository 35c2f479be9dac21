//! Assignability of a required type against a candidate bean type.
//!
//! Class-level subtyping is deliberately absent here: a required supertype
//! matches only because the candidate's legal-type *set* already contains
//! that supertype via the closure walk. The matcher itself compares class
//! uses invariantly and applies variance only where the required side asks
//! for it (wildcards) or unification introduces it (type variables).

use std::collections::HashSet;

use crate::closure::substitute_bindings;
use crate::{Bindings, TypeExpr, TypeUniverse, VarId, VarOwner, WildcardBound};

/// Does `candidate` satisfy `required`?
///
/// Both sides are expected to be fully substituted; required-side type
/// variables only appear during producer unification, which drives the
/// binding-carrying internals directly.
pub fn assignable(universe: &TypeUniverse, required: &TypeExpr, candidate: &TypeExpr) -> bool {
    let mut bindings = Bindings::new();
    let mut guard = HashSet::new();
    matches_with(universe, required, candidate, &mut bindings, &mut guard)
}

pub(crate) fn matches_with(
    u: &TypeUniverse,
    required: &TypeExpr,
    candidate: &TypeExpr,
    bindings: &mut Bindings,
    guard: &mut HashSet<VarId>,
) -> bool {
    match (required, candidate) {
        (
            TypeExpr::Class { def: rd, args: ra },
            TypeExpr::Class { def: cd, args: ca },
        ) => {
            if rd != cd {
                return false;
            }
            // A raw required type accepts any parameterization of the class.
            if ra.is_empty() && !ca.is_empty() {
                return true;
            }
            if ra.len() != ca.len() {
                return false;
            }
            ra.iter()
                .zip(ca.iter())
                .all(|(r, c)| argument_matches(u, r, c, bindings, guard))
        }
        // Arrays are invariant and never apply wildcard rules to elements.
        (TypeExpr::Array(re), TypeExpr::Array(ce)) => re == ce,
        (TypeExpr::Var(var), _) => bind_var(u, *var, candidate, bindings, guard),
        (_, TypeExpr::Var(var)) => var_accepts(u, *var, required, bindings, guard),
        _ => required == candidate,
    }
}

pub(crate) fn argument_matches(
    u: &TypeUniverse,
    required: &TypeExpr,
    candidate: &TypeExpr,
    bindings: &mut Bindings,
    guard: &mut HashSet<VarId>,
) -> bool {
    if required == candidate {
        return true;
    }
    match required {
        TypeExpr::Wildcard(WildcardBound::Unbounded) => true,
        TypeExpr::Wildcard(WildcardBound::Extends(bound)) => {
            covariant(u, candidate, bound, bindings, guard)
        }
        TypeExpr::Wildcard(WildcardBound::Super(bound)) => {
            covariant(u, bound, candidate, bindings, guard)
        }
        TypeExpr::Var(var) => bind_var(u, *var, candidate, bindings, guard),
        _ => matches_with(u, required, candidate, bindings, guard),
    }
}

/// Is `value` equal to `target`, or does `value`'s own ancestor chain contain
/// it? This is the covariant rule shared by `? extends` and bound checks; it
/// reuses the closure walk on the argument's class, not on the owning bean.
pub(crate) fn covariant(
    u: &TypeUniverse,
    value: &TypeExpr,
    target: &TypeExpr,
    bindings: &mut Bindings,
    guard: &mut HashSet<VarId>,
) -> bool {
    let Ok(ancestors) = u.closure(value) else {
        return false;
    };
    ancestors
        .iter()
        .any(|ancestor| matches_with(u, target, ancestor, bindings, guard))
}

/// Single-assignment unification of a required-side variable.
///
/// The binding is recorded tentatively *before* the bound check so that a
/// self-referential bound (`S extends Score<S>`) is tested against the
/// tentative value instead of recursing forever; `guard` short-circuits any
/// bound check that re-enters a variable already on the stack. A failed
/// bound check withdraws the tentative binding.
pub(crate) fn bind_var(
    u: &TypeUniverse,
    var: VarId,
    value: &TypeExpr,
    bindings: &mut Bindings,
    guard: &mut HashSet<VarId>,
) -> bool {
    if let Some(existing) = bindings.get(&var) {
        return existing == value;
    }
    if guard.contains(&var) {
        return true;
    }
    // Only producer-owned variables unify. A class-owned variable on the
    // required side means the caller handed over an unsubstituted parameter
    // of the requesting bean; nothing can satisfy it.
    if matches!(u.type_param(var).owner, VarOwner::Class(_)) {
        return false;
    }
    guard.insert(var);
    bindings.insert(var, value.clone());

    // Empty bounds mean the implicit top type, which everything satisfies.
    let bounds = u.type_param(var).upper_bounds.clone();
    let ok = bounds.iter().all(|bound| {
        let bound = substitute_bindings(bound, bindings);
        covariant(u, value, &bound, bindings, guard)
    });

    guard.remove(&var);
    if !ok {
        bindings.remove(&var);
    }
    ok
}

/// Candidate-side variable: a generic class bean that left its own
/// parameter in a legal type (`FooTyped<T>`) matches any required actual
/// argument the parameter could be instantiated at, so every declared
/// bound of the variable must hold for the required argument. The guard
/// lets a self-referential bound (`S extends Score<S>`) treat the
/// re-entrant occurrence as satisfied instead of recursing.
pub(crate) fn var_accepts(
    u: &TypeUniverse,
    var: VarId,
    value: &TypeExpr,
    bindings: &mut Bindings,
    guard: &mut HashSet<VarId>,
) -> bool {
    if !guard.insert(var) {
        return true;
    }
    let bounds = u.type_param(var).upper_bounds.clone();
    let ok = bounds.iter().all(|bound| {
        let bound = substitute_bindings(bound, bindings);
        covariant(u, value, &bound, bindings, guard)
    });
    guard.remove(&var);
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassId, ClassKind, TypeUniverse, UniverseBuilder};

    struct Fixture {
        u: TypeUniverse,
        holder: ClassId,
        number: ClassId,
        integer: ClassId,
        string: ClassId,
    }

    // class Number; class Integer extends Number; class String;
    // class Holder<T>
    fn fixture() -> Fixture {
        let mut b = UniverseBuilder::new();
        let number = b.declare_class("Number");
        let integer = b.declare_class("Integer");
        b.set_super_class(integer, number, vec![]);
        let string = b.declare_class("String");
        let holder = b.declare("Holder", ClassKind::Class, &["T"]);
        let u = b.finish().unwrap();
        Fixture {
            u,
            holder,
            number,
            integer,
            string,
        }
    }

    fn holder_of(f: &Fixture, arg: TypeExpr) -> TypeExpr {
        TypeExpr::class(f.holder, vec![arg])
    }

    #[test]
    fn identical_parameterizations_match() {
        let f = fixture();
        let ty = holder_of(&f, TypeExpr::raw(f.string));
        assert!(assignable(&f.u, &ty, &ty));
    }

    #[test]
    fn different_classes_never_match() {
        let f = fixture();
        assert!(!assignable(
            &f.u,
            &TypeExpr::raw(f.number),
            &TypeExpr::raw(f.integer)
        ));
    }

    #[test]
    fn upper_bounded_wildcard_is_covariant() {
        let f = fixture();
        let required = holder_of(&f, TypeExpr::wildcard_extends(TypeExpr::raw(f.number)));
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.integer))
        ));
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.number))
        ));
        assert!(!assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.string))
        ));
    }

    #[test]
    fn lower_bounded_wildcard_is_contravariant() {
        let f = fixture();
        let required = holder_of(&f, TypeExpr::wildcard_super(TypeExpr::raw(f.integer)));
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.number))
        ));
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.integer))
        ));
        assert!(!assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.string))
        ));
    }

    #[test]
    fn unbounded_wildcard_matches_anything() {
        let f = fixture();
        let required = holder_of(&f, TypeExpr::wildcard());
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::raw(f.string))
        ));
        assert!(assignable(
            &f.u,
            &required,
            &holder_of(&f, TypeExpr::array(TypeExpr::raw(f.number)))
        ));
    }

    #[test]
    fn raw_required_accepts_any_parameterization() {
        let f = fixture();
        assert!(assignable(
            &f.u,
            &TypeExpr::raw(f.holder),
            &holder_of(&f, TypeExpr::raw(f.string))
        ));
        // The reverse is not true.
        assert!(!assignable(
            &f.u,
            &holder_of(&f, TypeExpr::raw(f.string)),
            &TypeExpr::raw(f.holder)
        ));
    }

    #[test]
    fn arrays_are_invariant() {
        let f = fixture();
        let number_arr = TypeExpr::array(TypeExpr::raw(f.number));
        let integer_arr = TypeExpr::array(TypeExpr::raw(f.integer));
        assert!(assignable(&f.u, &number_arr, &number_arr));
        assert!(!assignable(&f.u, &number_arr, &integer_arr));
        assert!(!assignable(&f.u, &number_arr, &TypeExpr::raw(f.number)));
    }

    #[test]
    fn nested_arguments_match_recursively() {
        let f = fixture();
        let inner = holder_of(&f, TypeExpr::wildcard_extends(TypeExpr::raw(f.number)));
        let required = TypeExpr::class(f.holder, vec![inner]);
        let candidate = TypeExpr::class(
            f.holder,
            vec![holder_of(&f, TypeExpr::raw(f.integer))],
        );
        // The wildcard buried one level down still applies its covariant rule.
        assert!(assignable(&f.u, &required, &candidate));
        let wrong = TypeExpr::class(
            f.holder,
            vec![holder_of(&f, TypeExpr::raw(f.string))],
        );
        assert!(!assignable(&f.u, &required, &wrong));
    }

    #[test]
    fn class_owned_variable_on_the_required_side_never_binds() {
        let mut b = UniverseBuilder::new();
        let holder = b.declare("Holder", ClassKind::Class, &["T"]);
        let t = b.param(holder, 0);
        let string = b.declare_class("String");
        let u = b.finish().unwrap();

        // `Holder<T>` with Holder's own parameter is an unsubstituted
        // requirement; no parameterization satisfies it.
        let required = TypeExpr::class(holder, vec![TypeExpr::var(t)]);
        let candidate = TypeExpr::class(holder, vec![TypeExpr::raw(string)]);
        assert!(!assignable(&u, &required, &candidate));
        assert!(!assignable(&u, &TypeExpr::var(t), &TypeExpr::raw(string)));
    }

    #[test]
    fn candidate_side_variable_accepts_actuals_within_its_bounds() {
        let mut b = UniverseBuilder::new();
        let score = b.declare_interface("Score");
        let my_score = b.declare_class("MyScore");
        b.add_interface(my_score, score, vec![]);
        let string = b.declare_class("String");
        let manager = b.declare("ScoreManager", ClassKind::Class, &["S"]);
        let s = b.param(manager, 0);
        b.set_bounds(s, vec![TypeExpr::raw(score)]);
        let u = b.finish().unwrap();

        let candidate = TypeExpr::class(manager, vec![TypeExpr::var(s)]);
        assert!(assignable(
            &u,
            &TypeExpr::class(manager, vec![TypeExpr::raw(my_score)]),
            &candidate
        ));
        assert!(!assignable(
            &u,
            &TypeExpr::class(manager, vec![TypeExpr::raw(string)]),
            &candidate
        ));
    }
}
