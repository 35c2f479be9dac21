use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::display::DisplayType;
use crate::{ClassId, TypeError, TypeExpr, VarId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A class or interface declaration.
///
/// `super_class` and `interfaces` are expressed in terms of the declaring
/// class's own `type_params`, exactly as written in source
/// (`class ArrayList<E> implements List<E>`). They are always `Class`
/// expressions; the builder does not accept anything else.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<VarId>,
    pub super_class: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
}

/// Who declared a type parameter. Substitution is scoped by owner, so two
/// parameters spelled `S` in different scopes never collide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarOwner {
    Class(ClassId),
    /// A producer method or field, identified by its display name
    /// (e.g. `ScoreManagerBeanProvider2::scoreManager`).
    Producer(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub owner: VarOwner,
    /// Declared upper bounds. Empty means the implicit top-type bound.
    pub upper_bounds: Vec<TypeExpr>,
}

/// Immutable registry of class and type-parameter declarations.
///
/// Built once through [`UniverseBuilder`], then shared read-only; all lookups
/// are by interned id and infallible.
#[derive(Clone, Debug, Serialize)]
pub struct TypeUniverse {
    classes: Vec<ClassDef>,
    vars: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    object: ClassId,
}

impl TypeUniverse {
    /// The universal top type. Every class and interface reaches it.
    pub fn object(&self) -> ClassId {
        self.object
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn type_param(&self, id: VarId) -> &TypeParamDef {
        &self.vars[id.0 as usize]
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn display<'a>(&'a self, ty: &'a TypeExpr) -> DisplayType<'a> {
        DisplayType::new(self, ty)
    }

    pub fn render(&self, ty: &TypeExpr) -> String {
        self.display(ty).to_string()
    }
}

/// Two-phase builder for a [`TypeUniverse`].
///
/// Classes are declared first (name plus type-parameter names), which hands
/// out the ids needed to express mutually recursive hierarchies; supertypes
/// and bounds are attached afterwards. [`UniverseBuilder::finish`] validates
/// that every supertype and bound only references type parameters that are in
/// scope where they appear.
pub struct UniverseBuilder {
    classes: Vec<ClassDef>,
    vars: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    object: ClassId,
}

impl UniverseBuilder {
    pub fn new() -> Self {
        let mut builder = UniverseBuilder {
            classes: Vec::new(),
            vars: Vec::new(),
            by_name: HashMap::new(),
            object: ClassId(0),
        };
        builder.object = builder.declare("Object", ClassKind::Class, &[]);
        builder
    }

    pub fn object(&self) -> ClassId {
        self.object
    }

    /// Declare a class or interface along with its type-parameter names.
    pub fn declare(&mut self, name: &str, kind: ClassKind, param_names: &[&str]) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        let type_params = param_names
            .iter()
            .map(|param| {
                let var = VarId(self.vars.len() as u32);
                self.vars.push(TypeParamDef {
                    name: (*param).to_string(),
                    owner: VarOwner::Class(id),
                    upper_bounds: Vec::new(),
                });
                var
            })
            .collect();
        self.classes.push(ClassDef {
            name: name.to_string(),
            kind,
            type_params,
            super_class: None,
            interfaces: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Shorthand for a non-generic class with no explicit supertypes.
    pub fn declare_class(&mut self, name: &str) -> ClassId {
        self.declare(name, ClassKind::Class, &[])
    }

    pub fn declare_interface(&mut self, name: &str) -> ClassId {
        self.declare(name, ClassKind::Interface, &[])
    }

    /// The `idx`-th type parameter of `class`, as declared.
    pub fn param(&self, class: ClassId, idx: usize) -> VarId {
        self.classes[class.0 as usize].type_params[idx]
    }

    pub fn set_super_class(&mut self, class: ClassId, def: ClassId, args: Vec<TypeExpr>) {
        self.classes[class.0 as usize].super_class = Some(TypeExpr::class(def, args));
    }

    pub fn add_interface(&mut self, class: ClassId, def: ClassId, args: Vec<TypeExpr>) {
        self.classes[class.0 as usize]
            .interfaces
            .push(TypeExpr::class(def, args));
    }

    pub fn set_bounds(&mut self, var: VarId, upper_bounds: Vec<TypeExpr>) {
        self.vars[var.0 as usize].upper_bounds = upper_bounds;
    }

    /// Declare a type parameter owned by a producer method or field.
    ///
    /// Producer variables are not attached to any class; the resolver unifies
    /// them against the requested type per lookup.
    pub fn declare_producer_var(&mut self, producer: &str, name: &str) -> VarId {
        let var = VarId(self.vars.len() as u32);
        self.vars.push(TypeParamDef {
            name: name.to_string(),
            owner: VarOwner::Producer(producer.to_string()),
            upper_bounds: Vec::new(),
        });
        var
    }

    pub fn finish(mut self) -> Result<TypeUniverse, TypeError> {
        // Every class without an explicit superclass extends Object, and it
        // is also the implicit supertype of every interface (JLS 4.10.2).
        // Normalizing classes here keeps the closure walk uniform; interfaces
        // are handled during the walk so that `extends` chains stay faithful.
        let object = self.object;
        for (idx, class) in self.classes.iter_mut().enumerate() {
            if ClassId(idx as u32) != object
                && class.kind == ClassKind::Class
                && class.super_class.is_none()
            {
                class.super_class = Some(TypeExpr::raw(object));
            }
        }

        for (idx, class) in self.classes.iter().enumerate() {
            let id = ClassId(idx as u32);
            for supertype in class.super_class.iter().chain(class.interfaces.iter()) {
                self.check_scope(supertype, id, &class.name)?;
            }
            for &param in &class.type_params {
                for bound in &self.vars[param.0 as usize].upper_bounds {
                    self.check_scope(bound, id, &class.name)?;
                }
            }
        }

        Ok(TypeUniverse {
            classes: self.classes,
            vars: self.vars,
            by_name: self.by_name,
            object: self.object,
        })
    }

    /// Every `Var` inside `ty` must be a type parameter of `owner`.
    fn check_scope(&self, ty: &TypeExpr, owner: ClassId, owner_name: &str) -> Result<(), TypeError> {
        let owned = &self.classes[owner.0 as usize].type_params;
        let mut unbound = None;
        ty.mentions_var(&mut |var| {
            if !owned.contains(&var) {
                unbound.get_or_insert(var);
                true
            } else {
                false
            }
        });
        match unbound {
            Some(var) => Err(TypeError::UnboundTypeParameter {
                var: self.vars[var.0 as usize].name.clone(),
                owner: owner_name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for UniverseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_params_with_owner_scope() {
        let mut b = UniverseBuilder::new();
        let list = b.declare("List", ClassKind::Interface, &["E"]);
        let e = b.param(list, 0);
        let u = b.finish().unwrap();

        assert_eq!(u.class(list).name, "List");
        assert_eq!(u.type_param(e).name, "E");
        assert_eq!(u.type_param(e).owner, VarOwner::Class(list));
        assert_eq!(u.class_by_name("List"), Some(list));
    }

    #[test]
    fn plain_classes_implicitly_extend_object() {
        let mut b = UniverseBuilder::new();
        let foo = b.declare_class("Foo");
        let u = b.finish().unwrap();
        assert_eq!(
            u.class(foo).super_class,
            Some(TypeExpr::raw(u.object()))
        );
    }

    #[test]
    fn foreign_type_parameter_in_supertype_is_rejected() {
        let mut b = UniverseBuilder::new();
        let holder = b.declare("Holder", ClassKind::Class, &["T"]);
        let t = b.param(holder, 0);
        let bad = b.declare_class("Bad");
        // `class Bad extends Holder<T>` with T belonging to Holder, not Bad.
        b.set_super_class(bad, holder, vec![TypeExpr::var(t)]);

        let err = b.finish().unwrap_err();
        assert_eq!(
            err,
            TypeError::UnboundTypeParameter {
                var: "T".to_string(),
                owner: "Bad".to_string(),
            }
        );
    }
}
