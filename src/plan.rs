//! Construction plans and the plan compiler capability.
//!
//! A [`ConstructionPlan`] is an abstract, composable description of "how to
//! build a value": a tree of constructor applications, factory calls, and
//! constants. Plans are built once per producer (at first resolution, so
//! configuration-shape errors surface before use) and then handed to a
//! [`PlanCompiler`] which turns the tree into a cheaply re-invocable factory.
//! The default [`ClosureCompiler`] composes closures; hosts with code
//! generation can substitute their own compiler.

use std::sync::Arc;

use crate::context::ResolutionContext;
use crate::error::{DiError, DiResult};
use crate::inspector::{ConstructorDescriptor, PropertyDescriptor, ResolvedArgs};
use crate::registration::AnyArc;

/// Type-erased factory callable taking an explicit resolution context.
///
/// The context carries the container, the ambient scope, and the verification
/// flag, so no thread-local state is needed to pass resolution state down the
/// construction call stack.
pub type DynFactory =
    Arc<dyn for<'a> Fn(&ResolutionContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// A compiled, cheaply re-invocable factory produced by a [`PlanCompiler`].
pub type CompiledFactory = DynFactory;

/// Recursive description of how to construct a service instance.
pub enum ConstructionPlan {
    /// Apply a constructor to recursively planned arguments, then inject
    /// properties from their own sub-plans.
    New {
        /// Service name for error reporting
        service: &'static str,
        /// The single eligible constructor
        constructor: ConstructorDescriptor,
        /// One plan per constructor parameter, in order
        arguments: Vec<ConstructionPlan>,
        /// Injectable properties paired with the plan for their dependency
        properties: Vec<(PropertyDescriptor, ConstructionPlan)>,
    },
    /// Invoke a registered factory callable
    FactoryCall(DynFactory),
    /// Yield a fixed, pre-built instance
    Constant(AnyArc),
}

impl ConstructionPlan {
    /// Short structural description used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConstructionPlan::New { .. } => "new",
            ConstructionPlan::FactoryCall(_) => "factory",
            ConstructionPlan::Constant(_) => "constant",
        }
    }
}

/// Plan compiler capability: turns a construction plan into a factory.
///
/// Compilation happens at most once per producer; the resulting factory must
/// be cheaply re-invocable. Implementations may compile to closures, generated
/// functions, or interpreted tree-walkers.
pub trait PlanCompiler: Send + Sync {
    /// Compiles the plan into a reusable factory.
    fn compile(&self, plan: &ConstructionPlan) -> CompiledFactory;
}

/// Default compiler: composes the plan tree into nested closures.
pub struct ClosureCompiler;

impl PlanCompiler for ClosureCompiler {
    fn compile(&self, plan: &ConstructionPlan) -> CompiledFactory {
        match plan {
            ConstructionPlan::Constant(value) => {
                let value = value.clone();
                Arc::new(move |_| Ok(value.clone()))
            }
            ConstructionPlan::FactoryCall(factory) => factory.clone(),
            ConstructionPlan::New {
                service,
                constructor,
                arguments,
                properties,
            } => {
                let arg_factories: Vec<CompiledFactory> =
                    arguments.iter().map(|p| self.compile(p)).collect();
                let prop_factories: Vec<(PropertyDescriptor, CompiledFactory)> = properties
                    .iter()
                    .map(|(d, p)| (d.clone(), self.compile(p)))
                    .collect();
                let constructor = constructor.clone();
                let service = *service;

                Arc::new(move |ctx| {
                    let values = arg_factories
                        .iter()
                        .map(|f| f(ctx))
                        .collect::<DiResult<Vec<_>>>()?;
                    let args = ResolvedArgs::new(values);
                    let instance =
                        constructor
                            .construct(&args)
                            .map_err(|e| DiError::FactoryThrew {
                                service,
                                message: e.to_string(),
                            })?;
                    for (property, dep_factory) in &prop_factories {
                        let dependency = dep_factory(ctx)?;
                        property.apply(&instance, dependency).map_err(|e| {
                            DiError::FactoryThrew {
                                service,
                                message: format!("property {}: {}", property.name(), e),
                            }
                        })?;
                    }
                    Ok(instance)
                })
            }
        }
    }
}
