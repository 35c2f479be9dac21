//! Algebraic model of Java-like generic types for Weft's bean resolution.
//!
//! The model is deliberately reflection-free: classes, interfaces and type
//! parameters are declared up front into a [`TypeUniverse`] and referenced by
//! interned ids afterwards. Type expressions ([`TypeExpr`]) are plain data and
//! cheap to clone; recursive bounds (`S extends Score<S>`) stay finite because
//! a [`TypeExpr::Var`] is an identity reference whose bounds live in the
//! universe's declaration table, never inline in the expression.
//!
//! On top of the model this crate provides:
//! - the supertype closure walk ([`TypeUniverse::closure`]), which turns a
//!   declared type into the full set of types it can be viewed as,
//! - the assignability matcher ([`assignable`]),
//! - producer-signature unification ([`unify_producer`]).

mod assign;
mod closure;
mod display;
mod unify;
mod universe;

pub use assign::assignable;
pub use display::DisplayType;
pub use unify::{unify_producer, Bindings};
pub use universe::{ClassDef, ClassKind, TypeParamDef, TypeUniverse, UniverseBuilder, VarOwner};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interned id of a class or interface declared in a [`TypeUniverse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Interned id of a declared type parameter (class-owned or producer-owned).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

/// A type expression.
///
/// Structural equality is the identity used throughout the resolver: two
/// expressions are "the same type" iff they are `==`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A class or interface use. `args` is empty both for non-generic classes
    /// and for raw uses of generic ones.
    Class { def: ClassId, args: Vec<TypeExpr> },
    /// Identity reference to a declared type parameter.
    Var(VarId),
    Wildcard(WildcardBound),
    Array(Box<TypeExpr>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeExpr>),
    Super(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn class(def: ClassId, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Class { def, args }
    }

    /// A raw (or non-generic) class use.
    pub fn raw(def: ClassId) -> Self {
        TypeExpr::Class { def, args: Vec::new() }
    }

    pub fn var(var: VarId) -> Self {
        TypeExpr::Var(var)
    }

    pub fn array(element: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(element))
    }

    pub fn wildcard() -> Self {
        TypeExpr::Wildcard(WildcardBound::Unbounded)
    }

    /// `? extends bound`
    pub fn wildcard_extends(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    /// `? super bound`
    pub fn wildcard_super(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    /// Does any `Var` inside this expression satisfy `pred`?
    pub fn mentions_var(&self, pred: &mut dyn FnMut(VarId) -> bool) -> bool {
        match self {
            TypeExpr::Class { args, .. } => args.iter().any(|a| a.mentions_var(pred)),
            TypeExpr::Var(v) => pred(*v),
            TypeExpr::Wildcard(WildcardBound::Unbounded) => false,
            TypeExpr::Wildcard(WildcardBound::Extends(b))
            | TypeExpr::Wildcard(WildcardBound::Super(b)) => b.mentions_var(pred),
            TypeExpr::Array(elem) => elem.mentions_var(pred),
        }
    }
}

/// Errors raised while declaring a universe or walking a type hierarchy.
///
/// These are configuration errors: the declarations handed to the builder (or
/// a type use inside them) are structurally broken. They are never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A supertype (or bound) references a type parameter that is not bound
    /// in the scope it appears in.
    #[error("type parameter `{var}` is not bound in the declaration of `{owner}`")]
    UnboundTypeParameter { var: String, owner: String },

    /// A generic class was used with the wrong number of type arguments.
    #[error("`{class}` declares {expected} type parameter(s) but was used with {found}")]
    ArityMismatch {
        class: String,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn type_exprs_serialize_compactly() {
        let ty = TypeExpr::class(
            ClassId(3),
            vec![TypeExpr::wildcard_extends(TypeExpr::raw(ClassId(1)))],
        );
        assert_eq!(
            serde_json::to_value(&ty).unwrap(),
            json!({
                "Class": {
                    "def": 3,
                    "args": [
                        { "Wildcard": { "Extends": { "Class": { "def": 1, "args": [] } } } }
                    ]
                }
            })
        );
    }

    #[test]
    fn mentions_var_sees_through_wildcards_and_arrays() {
        let v = VarId(7);
        let ty = TypeExpr::array(TypeExpr::class(
            ClassId(0),
            vec![TypeExpr::wildcard_extends(TypeExpr::var(v))],
        ));
        assert!(ty.mentions_var(&mut |var| var == v));
        assert!(!ty.mentions_var(&mut |var| var == VarId(8)));
    }
}
