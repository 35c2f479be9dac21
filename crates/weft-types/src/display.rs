use std::fmt;

use crate::{TypeExpr, TypeUniverse, WildcardBound};

/// Java-like rendering of a [`TypeExpr`] (`Map<String, Bar>`,
/// `? extends Number`, `Foo[]`). Used for diagnostics only; structural
/// equality on [`TypeExpr`] is the real identity.
pub struct DisplayType<'a> {
    universe: &'a TypeUniverse,
    ty: &'a TypeExpr,
}

impl<'a> DisplayType<'a> {
    pub(crate) fn new(universe: &'a TypeUniverse, ty: &'a TypeExpr) -> Self {
        DisplayType { universe, ty }
    }
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(self.universe, self.ty, f)
    }
}

fn write_type(u: &TypeUniverse, ty: &TypeExpr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ty {
        TypeExpr::Class { def, args } => {
            f.write_str(&u.class(*def).name)?;
            if !args.is_empty() {
                f.write_str("<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write_type(u, arg, f)?;
                }
                f.write_str(">")?;
            }
            Ok(())
        }
        TypeExpr::Var(var) => f.write_str(&u.type_param(*var).name),
        TypeExpr::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
        TypeExpr::Wildcard(WildcardBound::Extends(bound)) => {
            f.write_str("? extends ")?;
            write_type(u, bound, f)
        }
        TypeExpr::Wildcard(WildcardBound::Super(bound)) => {
            f.write_str("? super ")?;
            write_type(u, bound, f)
        }
        TypeExpr::Array(element) => {
            write_type(u, element, f)?;
            f.write_str("[]")
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ClassKind, TypeExpr, UniverseBuilder};

    #[test]
    fn renders_nested_generics_and_wildcards() {
        let mut b = UniverseBuilder::new();
        let map = b.declare("Map", ClassKind::Interface, &["K", "V"]);
        let string = b.declare_class("String");
        let number = b.declare_class("Number");
        let u = b.finish().unwrap();

        let ty = TypeExpr::class(
            map,
            vec![
                TypeExpr::raw(string),
                TypeExpr::wildcard_extends(TypeExpr::raw(number)),
            ],
        );
        assert_eq!(u.render(&ty), "Map<String, ? extends Number>");
        assert_eq!(u.render(&TypeExpr::array(TypeExpr::raw(string))), "String[]");
        assert_eq!(u.render(&TypeExpr::wildcard()), "?");
    }
}
