//! Supertype closure: the set of types a declared type can legally be viewed
//! as, computed by walking the supertype graph and substituting type
//! arguments along the way.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{ClassKind, TypeError, TypeExpr, TypeUniverse, VarId};

impl TypeUniverse {
    /// All types `ty` can be viewed as, starting with `ty` itself.
    ///
    /// For a class use this walks superclasses and interfaces, substituting
    /// the declaring class's type parameters with the use's arguments at each
    /// level (`ArrayList<String>` yields `List<String>`, `Collection<String>`,
    /// ..., `Object`). Raw uses stay raw all the way up; parameterized uses
    /// never produce additional raw forms. Results are deduplicated
    /// structurally and include the top type.
    ///
    /// Arrays expose themselves and `Object`. Type variables and wildcards
    /// have no hierarchy of their own and yield only themselves.
    pub fn closure(&self, ty: &TypeExpr) -> Result<Vec<TypeExpr>, TypeError> {
        match ty {
            TypeExpr::Class { .. } => self.class_closure(ty),
            TypeExpr::Array(_) => Ok(vec![ty.clone(), TypeExpr::raw(self.object())]),
            _ => Ok(vec![ty.clone()]),
        }
    }

    fn class_closure(&self, ty: &TypeExpr) -> Result<Vec<TypeExpr>, TypeError> {
        let mut out = Vec::new();
        let mut seen: HashSet<TypeExpr> = HashSet::new();
        let mut queue: VecDeque<TypeExpr> = VecDeque::new();
        queue.push_back(ty.clone());

        while let Some(current) = queue.pop_front() {
            let TypeExpr::Class { def, ref args } = current else {
                continue;
            };
            if !seen.insert(current.clone()) {
                continue;
            }

            let class = self.class(def);
            let raw = args.is_empty() && !class.type_params.is_empty();

            if raw {
                // A raw use carries no arguments to substitute; its whole
                // ancestor chain is visited raw as well.
                for supertype in class.super_class.iter().chain(class.interfaces.iter()) {
                    if let TypeExpr::Class { def, .. } = supertype {
                        queue.push_back(TypeExpr::raw(*def));
                    }
                }
            } else {
                if !class.type_params.is_empty() && args.len() != class.type_params.len() {
                    return Err(TypeError::ArityMismatch {
                        class: class.name.clone(),
                        expected: class.type_params.len(),
                        found: args.len(),
                    });
                }
                let subst: HashMap<VarId, TypeExpr> = class
                    .type_params
                    .iter()
                    .copied()
                    .zip(args.iter().cloned())
                    .collect();
                for supertype in class.super_class.iter().chain(class.interfaces.iter()) {
                    queue.push_back(self.substitute_checked(supertype, &subst, &class.name)?);
                }
            }

            if class.kind == ClassKind::Interface {
                queue.push_back(TypeExpr::raw(self.object()));
            }

            out.push(current);
        }

        Ok(out)
    }

    /// Substitute `subst` into `ty`, failing on any variable the map does not
    /// cover. Used on supertype declarations, where a dangling variable means
    /// the hierarchy itself is invalid.
    fn substitute_checked(
        &self,
        ty: &TypeExpr,
        subst: &HashMap<VarId, TypeExpr>,
        owner: &str,
    ) -> Result<TypeExpr, TypeError> {
        match ty {
            TypeExpr::Class { def, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.substitute_checked(arg, subst, owner))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeExpr::class(*def, args))
            }
            TypeExpr::Var(var) => match subst.get(var) {
                Some(replacement) => Ok(replacement.clone()),
                None => Err(TypeError::UnboundTypeParameter {
                    var: self.type_param(*var).name.clone(),
                    owner: owner.to_string(),
                }),
            },
            TypeExpr::Wildcard(crate::WildcardBound::Unbounded) => Ok(ty.clone()),
            TypeExpr::Wildcard(crate::WildcardBound::Extends(bound)) => Ok(
                TypeExpr::wildcard_extends(self.substitute_checked(bound, subst, owner)?),
            ),
            TypeExpr::Wildcard(crate::WildcardBound::Super(bound)) => Ok(TypeExpr::wildcard_super(
                self.substitute_checked(bound, subst, owner)?,
            )),
            TypeExpr::Array(element) => Ok(TypeExpr::array(
                self.substitute_checked(element, subst, owner)?,
            )),
        }
    }
}

/// Substitute `bindings` into `ty`, leaving unknown variables in place.
/// Used on bounds during matching, where an unbound variable is legitimate
/// (it simply has not been unified yet).
pub(crate) fn substitute_bindings(ty: &TypeExpr, bindings: &HashMap<VarId, TypeExpr>) -> TypeExpr {
    match ty {
        TypeExpr::Class { def, args } => TypeExpr::class(
            *def,
            args.iter()
                .map(|arg| substitute_bindings(arg, bindings))
                .collect(),
        ),
        TypeExpr::Var(var) => match bindings.get(var) {
            Some(replacement) => replacement.clone(),
            None => ty.clone(),
        },
        TypeExpr::Wildcard(crate::WildcardBound::Unbounded) => ty.clone(),
        TypeExpr::Wildcard(crate::WildcardBound::Extends(bound)) => {
            TypeExpr::wildcard_extends(substitute_bindings(bound, bindings))
        }
        TypeExpr::Wildcard(crate::WildcardBound::Super(bound)) => {
            TypeExpr::wildcard_super(substitute_bindings(bound, bindings))
        }
        TypeExpr::Array(element) => TypeExpr::array(substitute_bindings(element, bindings)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{ClassId, ClassKind, TypeError, TypeExpr, TypeUniverse, UniverseBuilder};

    struct Fixture {
        u: TypeUniverse,
        object: ClassId,
        collection: ClassId,
        list: ClassId,
        array_list: ClassId,
        string: ClassId,
    }

    // interface Collection<E>; interface List<E> extends Collection<E>;
    // class ArrayList<E> implements List<E>; class String
    fn fixture() -> Fixture {
        let mut b = UniverseBuilder::new();
        let collection = b.declare("Collection", ClassKind::Interface, &["E"]);
        let list = b.declare("List", ClassKind::Interface, &["E"]);
        b.add_interface(list, collection, vec![TypeExpr::var(b.param(list, 0))]);
        let array_list = b.declare("ArrayList", ClassKind::Class, &["E"]);
        b.add_interface(array_list, list, vec![TypeExpr::var(b.param(array_list, 0))]);
        let string = b.declare_class("String");
        let object = b.object();
        let u = b.finish().unwrap();
        Fixture {
            u,
            object,
            collection,
            list,
            array_list,
            string,
        }
    }

    #[test]
    fn substitutes_arguments_through_the_hierarchy() {
        let f = fixture();
        let string = TypeExpr::raw(f.string);
        let declared = TypeExpr::class(f.array_list, vec![string.clone()]);

        let closure = f.u.closure(&declared).unwrap();
        assert!(closure.contains(&declared));
        assert!(closure.contains(&TypeExpr::class(f.list, vec![string.clone()])));
        assert!(closure.contains(&TypeExpr::class(f.collection, vec![string])));
        assert!(closure.contains(&TypeExpr::raw(f.object)));
        // No raw List/Collection alongside the parameterized forms.
        assert!(!closure.contains(&TypeExpr::raw(f.list)));
        assert!(!closure.contains(&TypeExpr::raw(f.collection)));
    }

    #[test]
    fn raw_use_stays_raw_upward() {
        let f = fixture();
        let closure = f.u.closure(&TypeExpr::raw(f.array_list)).unwrap();
        assert!(closure.contains(&TypeExpr::raw(f.list)));
        assert!(closure.contains(&TypeExpr::raw(f.collection)));
        assert!(closure.contains(&TypeExpr::raw(f.object)));
    }

    #[test]
    fn closure_is_deduplicated() {
        // Diamond: class Both<T> extends Base implements Left<T>, Right<T>
        // where both interfaces extend Top<T>.
        let mut b = UniverseBuilder::new();
        let top = b.declare("Top", ClassKind::Interface, &["T"]);
        let left = b.declare("Left", ClassKind::Interface, &["T"]);
        b.add_interface(left, top, vec![TypeExpr::var(b.param(left, 0))]);
        let right = b.declare("Right", ClassKind::Interface, &["T"]);
        b.add_interface(right, top, vec![TypeExpr::var(b.param(right, 0))]);
        let both = b.declare("Both", ClassKind::Class, &["T"]);
        b.add_interface(both, left, vec![TypeExpr::var(b.param(both, 0))]);
        b.add_interface(both, right, vec![TypeExpr::var(b.param(both, 0))]);
        let string = b.declare_class("String");
        let u = b.finish().unwrap();

        let closure = u
            .closure(&TypeExpr::class(both, vec![TypeExpr::raw(string)]))
            .unwrap();
        let tops = closure
            .iter()
            .filter(|ty| matches!(ty, TypeExpr::Class { def, .. } if *def == top))
            .count();
        assert_eq!(tops, 1);
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let f = fixture();
        let declared = TypeExpr::class(
            f.array_list,
            vec![TypeExpr::raw(f.string), TypeExpr::raw(f.string)],
        );
        assert_eq!(
            f.u.closure(&declared),
            Err(TypeError::ArityMismatch {
                class: "ArrayList".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn array_exposes_object() {
        let f = fixture();
        let arr = TypeExpr::array(TypeExpr::raw(f.string));
        let closure = f.u.closure(&arr).unwrap();
        assert_eq!(closure, vec![arr, TypeExpr::raw(f.object)]);
    }
}
