//! Bean resolution over Weft's generic type model.
//!
//! A [`BeanRegistry`] is built once from scanner-provided [`BeanSeed`]s:
//! every class bean's supertype closure is computed and cached, producer
//! signatures are validated, and the result is frozen. Lookups
//! ([`BeanRegistry::resolve`]) filter candidates by selector tags, test the
//! required type against each candidate's legal types (unifying producer
//! type variables on the fly), and disambiguate by default preference and
//! priority. [`BeanRegistry::validate_all`] runs the same resolution over a
//! whole bean graph up front so misconfigurations fail at startup rather
//! than on first use.
//!
//! Lifecycle concerns (instantiation, scoping, proxying, events,
//! interception) are explicitly out of scope; this crate decides *which*
//! bean satisfies a request and nothing else.

mod bean;
mod error;
mod registry;

pub use bean::{BeanDefinition, BeanId, BeanKind, BeanSeed, InjectionPoint, Resolution, Tag};
pub use error::ResolveError;
pub use registry::BeanRegistry;

pub use weft_types::{
    assignable, unify_producer, ClassId, ClassKind, TypeError, TypeExpr, TypeUniverse,
    UniverseBuilder, VarId, WildcardBound,
};
