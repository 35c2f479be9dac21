use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use weft_types::{assignable, unify_producer, TypeExpr, TypeUniverse, VarId, VarOwner};

use crate::{BeanDefinition, BeanId, BeanSeed, InjectionPoint, Resolution, ResolveError};

/// Build-once, read-many store of bean definitions and their legal types.
///
/// Construction runs single-threaded and computes every CLASS/SYNTHETIC
/// bean's supertype closure up front; after `build` returns, the registry is
/// immutable and lookups are pure reads, safe for unsynchronized concurrent
/// use. Dynamic re-registration is expressed by building a fresh registry and
/// swapping the `Arc`.
#[derive(Debug)]
pub struct BeanRegistry {
    universe: Arc<TypeUniverse>,
    beans: Vec<BeanDefinition>,
    /// Indexed by `BeanId`. For producer beans this is the declared type
    /// alone; producers are unified per lookup instead of closed over.
    legal_types: Vec<Vec<TypeExpr>>,
}

impl BeanRegistry {
    pub fn build(
        universe: Arc<TypeUniverse>,
        seeds: Vec<BeanSeed>,
    ) -> Result<BeanRegistry, ResolveError> {
        let mut beans = Vec::with_capacity(seeds.len());
        let mut legal_types = Vec::with_capacity(seeds.len());

        for (idx, seed) in seeds.into_iter().enumerate() {
            let id = BeanId(idx as u32);
            let legal = if seed.kind.is_producer() {
                validate_producer(&universe, &seed)?;
                vec![seed.declared_type.clone()]
            } else {
                universe.closure(&seed.declared_type)?
            };
            debug!(
                bean = %seed.name,
                kind = ?seed.kind,
                legal_types = legal.len(),
                "registered bean"
            );
            beans.push(BeanDefinition {
                id,
                name: seed.name,
                kind: seed.kind,
                declared_type: seed.declared_type,
                type_params: seed.type_params,
                tags: seed.tags,
                is_default: seed.is_default,
                priority: seed.priority,
            });
            legal_types.push(legal);
        }

        Ok(BeanRegistry {
            universe,
            beans,
            legal_types,
        })
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    pub fn bean(&self, id: BeanId) -> &BeanDefinition {
        &self.beans[id.0 as usize]
    }

    pub fn beans(&self) -> impl Iterator<Item = &BeanDefinition> {
        self.beans.iter()
    }

    /// The cached legal-type set of a bean (the declared type alone for
    /// producers).
    pub fn legal_types(&self, id: BeanId) -> &[TypeExpr] {
        &self.legal_types[id.0 as usize]
    }

    /// Resolve one injection point to exactly one bean, or report how that
    /// failed. Never panics and performs no mutation.
    pub fn resolve(&self, point: &InjectionPoint) -> Resolution {
        // A required type still carrying some class's own type variable is
        // a point the scanner failed to substitute; it can never be
        // satisfied, not even by a bean whose legal types mention the same
        // variable.
        let dangling = point.required_type.mentions_var(&mut |var| {
            matches!(self.universe.type_param(var).owner, VarOwner::Class(_))
        });
        if dangling {
            trace!(
                required = %self.universe.display(&point.required_type),
                "required type mentions a class-owned type variable"
            );
            return Resolution::Unsatisfied;
        }

        let mut candidates: Vec<BeanId> = Vec::new();
        for bean in &self.beans {
            if !point.required_tags.is_subset(&bean.tags) {
                continue;
            }
            if self.bean_matches(bean, &point.required_type) {
                candidates.push(bean.id);
            }
        }
        trace!(
            required = %self.universe.display(&point.required_type),
            candidates = candidates.len(),
            "matched injection point"
        );

        match candidates.len() {
            0 => Resolution::Unsatisfied,
            1 => Resolution::Resolved(candidates[0]),
            _ => self.disambiguate(candidates),
        }
    }

    /// Like [`BeanRegistry::resolve`], with failures turned into diagnostic
    /// errors carrying rendered types and candidate names.
    pub fn resolve_required(
        &self,
        point: &InjectionPoint,
    ) -> Result<&BeanDefinition, ResolveError> {
        match self.resolve(point) {
            Resolution::Resolved(id) => Ok(self.bean(id)),
            Resolution::Unsatisfied => Err(ResolveError::Unsatisfied {
                required: self.universe.render(&point.required_type),
                tags: point
                    .required_tags
                    .iter()
                    .map(|tag| tag.as_str().to_string())
                    .collect(),
            }),
            Resolution::Ambiguous(ids) => Err(ResolveError::Ambiguous {
                required: self.universe.render(&point.required_type),
                candidates: ids
                    .into_iter()
                    .map(|id| self.bean(id).name.clone())
                    .collect(),
            }),
        }
    }

    /// Fail-fast startup sweep: resolve every injection point once so that
    /// unsatisfied/ambiguous dependencies are reported before the process
    /// serves anything. Outcomes are returned in input order.
    pub fn validate_all<'a>(
        &self,
        points: impl IntoIterator<Item = &'a InjectionPoint>,
    ) -> Vec<Resolution> {
        points
            .into_iter()
            .map(|point| {
                let outcome = self.resolve(point);
                match &outcome {
                    Resolution::Resolved(_) => {}
                    Resolution::Unsatisfied => warn!(
                        required = %self.universe.display(&point.required_type),
                        "unsatisfied dependency"
                    ),
                    Resolution::Ambiguous(ids) => warn!(
                        required = %self.universe.display(&point.required_type),
                        candidates = ids.len(),
                        "ambiguous dependency"
                    ),
                }
                outcome
            })
            .collect()
    }

    fn bean_matches(&self, bean: &BeanDefinition, required: &TypeExpr) -> bool {
        if bean.kind.is_producer() {
            unify_producer(
                &self.universe,
                required,
                &bean.declared_type,
                &bean.type_params,
            )
            .is_some()
        } else {
            self.legal_types[bean.id.0 as usize]
                .iter()
                .any(|legal| assignable(&self.universe, required, legal))
        }
    }

    /// Default preference first, then strictly highest priority (a set
    /// priority beats none). Anything still tied is ambiguous.
    fn disambiguate(&self, candidates: Vec<BeanId>) -> Resolution {
        let mut remaining = candidates;

        let defaults: Vec<BeanId> = remaining
            .iter()
            .copied()
            .filter(|id| self.bean(*id).is_default)
            .collect();
        if !defaults.is_empty() {
            remaining = defaults;
        }
        if remaining.len() == 1 {
            return Resolution::Resolved(remaining[0]);
        }

        if let Some(best) = remaining
            .iter()
            .filter_map(|id| self.bean(*id).priority)
            .max()
        {
            let top: Vec<BeanId> = remaining
                .iter()
                .copied()
                .filter(|id| self.bean(*id).priority == Some(best))
                .collect();
            if top.len() == 1 {
                return Resolution::Resolved(top[0]);
            }
            remaining = top;
        }

        Resolution::Ambiguous(remaining)
    }
}

/// Structural checks on a producer seed: the declared type may only mention
/// the producer's own variables, and those variables' bounds may only mention
/// producer-owned variables in turn.
fn validate_producer(universe: &TypeUniverse, seed: &BeanSeed) -> Result<(), ResolveError> {
    let owned: HashSet<VarId> = seed.type_params.iter().copied().collect();

    let mut foreign = None;
    seed.declared_type.mentions_var(&mut |var| {
        if !owned.contains(&var) {
            foreign.get_or_insert(var);
            true
        } else {
            false
        }
    });
    if let Some(var) = foreign {
        return Err(ResolveError::InvalidProducerSignature {
            bean: seed.name.clone(),
            detail: format!(
                "declared type mentions `{}`, which the producer does not declare",
                universe.type_param(var).name
            ),
        });
    }

    for &var in &seed.type_params {
        let param = universe.type_param(var);
        if !matches!(param.owner, VarOwner::Producer(_)) {
            return Err(ResolveError::InvalidProducerSignature {
                bean: seed.name.clone(),
                detail: format!("`{}` is not a producer-owned type variable", param.name),
            });
        }
        for bound in &param.upper_bounds {
            let mut foreign = None;
            bound.mentions_var(&mut |bound_var| {
                if !owned.contains(&bound_var) {
                    foreign.get_or_insert(bound_var);
                    true
                } else {
                    false
                }
            });
            if let Some(bound_var) = foreign {
                return Err(ResolveError::InvalidProducerSignature {
                    bean: seed.name.clone(),
                    detail: format!(
                        "bound of `{}` mentions `{}`, which the producer does not declare",
                        param.name,
                        universe.type_param(bound_var).name
                    ),
                });
            }
        }
    }

    Ok(())
}
