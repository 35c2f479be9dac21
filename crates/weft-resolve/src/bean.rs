use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use weft_types::{TypeExpr, VarId};

/// Index of a bean inside its registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeanId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanKind {
    Class,
    ProducerMethod,
    ProducerField,
    Synthetic,
}

impl BeanKind {
    pub fn is_producer(self) -> bool {
        matches!(self, BeanKind::ProducerMethod | BeanKind::ProducerField)
    }
}

/// An opaque qualifier narrowing which beans satisfy an injection point,
/// independent of type. Matching is exact set inclusion, no hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the metadata scanner hands the registry for one bean.
///
/// `declared_type` is the bean class's type for CLASS/SYNTHETIC kinds and the
/// producer's return/field type for producer kinds; `type_params` lists the
/// producer's own type variables (always empty otherwise).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeanSeed {
    pub name: String,
    pub kind: BeanKind,
    pub declared_type: TypeExpr,
    pub type_params: Vec<VarId>,
    pub tags: BTreeSet<Tag>,
    pub is_default: bool,
    pub priority: Option<i32>,
}

impl BeanSeed {
    fn new(name: impl Into<String>, kind: BeanKind, declared_type: TypeExpr) -> Self {
        BeanSeed {
            name: name.into(),
            kind,
            declared_type,
            type_params: Vec::new(),
            tags: BTreeSet::new(),
            is_default: false,
            priority: None,
        }
    }

    pub fn class(name: impl Into<String>, declared_type: TypeExpr) -> Self {
        Self::new(name, BeanKind::Class, declared_type)
    }

    pub fn synthetic(name: impl Into<String>, declared_type: TypeExpr) -> Self {
        Self::new(name, BeanKind::Synthetic, declared_type)
    }

    pub fn producer_method(
        name: impl Into<String>,
        declared_type: TypeExpr,
        type_params: Vec<VarId>,
    ) -> Self {
        let mut seed = Self::new(name, BeanKind::ProducerMethod, declared_type);
        seed.type_params = type_params;
        seed
    }

    pub fn producer_field(name: impl Into<String>, declared_type: TypeExpr) -> Self {
        Self::new(name, BeanKind::ProducerField, declared_type)
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn default_bean(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// A registered bean. Owned exclusively by the registry and immutable after
/// construction.
#[derive(Clone, Debug, Serialize)]
pub struct BeanDefinition {
    pub id: BeanId,
    pub name: String,
    pub kind: BeanKind,
    pub declared_type: TypeExpr,
    pub type_params: Vec<VarId>,
    pub tags: BTreeSet<Tag>,
    pub is_default: bool,
    pub priority: Option<i32>,
}

/// One lookup request: a required type (already substituted against the
/// requesting bean's own generics by the scanner) plus selector tags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InjectionPoint {
    pub required_type: TypeExpr,
    pub required_tags: BTreeSet<Tag>,
}

impl InjectionPoint {
    pub fn new(required_type: TypeExpr) -> Self {
        InjectionPoint {
            required_type,
            required_tags: BTreeSet::new(),
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.required_tags.insert(tag);
        self
    }
}

/// Outcome of resolving one injection point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Resolved(BeanId),
    Unsatisfied,
    /// More than one candidate survived disambiguation; candidates are listed
    /// in registration order.
    Ambiguous(Vec<BeanId>),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}
