//! Producers: the per-registration resolution pipeline.
//!
//! A producer owns everything one registration needs at resolution time: the
//! immutable registration record, a lazily compiled factory, the singleton
//! cell, and a cycle validator that lives until the first successful build.
//! Compilation and singleton construction both go through `get_or_try_init`,
//! so a failed build leaves the cell empty and the same error reproduces on
//! retry instead of caching a broken state.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::context::ResolutionContext;
use crate::error::{DiError, DiResult};
use crate::internal::CyclicDependencyValidator;
use crate::lifestyle::Lifestyle;
use crate::plan::{CompiledFactory, ConstructionPlan};
use crate::registration::{AnyArc, Registration, RegistrationSource};

pub(crate) struct Producer {
    registration: Registration,
    compiled: OnceCell<CompiledFactory>,
    singleton: OnceCell<AnyArc>,
    // Present until the first successful build proves the graph acyclic.
    validator: Mutex<Option<Arc<CyclicDependencyValidator>>>,
    // Set on the first successful build; once true, get_instance skips the
    // validator mutex entirely.
    validated: AtomicBool,
}

impl Producer {
    pub fn new(registration: Registration) -> Self {
        let validator = CyclicDependencyValidator::new(registration.key.display_name());
        Self {
            registration,
            compiled: OnceCell::new(),
            singleton: OnceCell::new(),
            validator: Mutex::new(Some(Arc::new(validator))),
            validated: AtomicBool::new(false),
        }
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Resolves one instance according to the registration's lifestyle.
    pub fn get_instance(&self, ctx: &ResolutionContext<'_>) -> DiResult<AnyArc> {
        // Enter cycle detection before touching the singleton cell, so a
        // reentrant build on the same thread reports SelfDependency instead
        // of deadlocking inside the cell's initialization. After the first
        // successful build the atomic flag short-circuits the lock.
        let guard = if self.validated.load(Ordering::Acquire) {
            None
        } else {
            match self.validator.lock().unwrap().clone() {
                Some(v) => Some(v.enter()?),
                None => None,
            }
        };

        let value = match self.registration.lifestyle {
            Lifestyle::Singleton => self
                .singleton
                .get_or_try_init(|| self.produce(ctx))
                .cloned()?,
            Lifestyle::Scoped => match ctx.scope {
                Some(scope) => {
                    scope.get_or_create(&self.registration.key, || self.produce(ctx))?
                }
                // Verification builds a throwaway instance when no scope is
                // ambient, so scoped registrations still get exercised.
                None if ctx.verifying => self.produce(ctx)?,
                None => {
                    return Err(DiError::OutsideScope(self.registration.key.display_name()))
                }
            },
            Lifestyle::Transient => self.produce(ctx)?,
        };

        if guard.is_some() {
            // The build completed, so this producer cannot be part of a
            // cycle; retire the validator to take it off the hot path.
            self.validated.store(true, Ordering::Release);
            *self.validator.lock().unwrap() = None;
        }
        Ok(value)
    }

    fn produce(&self, ctx: &ResolutionContext<'_>) -> DiResult<AnyArc> {
        let value = if let Some(factory) = self.compiled.get() {
            factory(ctx)?
        } else if ctx.verifying {
            // Verification must not bake throwaway dependency producers into
            // the cached factory; compile one-shot and discard it.
            let factory = self.build(ctx)?;
            factory(ctx)?
        } else {
            let factory = self.compiled.get_or_try_init(|| self.build(ctx))?;
            factory(ctx)?
        };
        ctx.container.apply_initializers(&self.registration.key, &value);
        Ok(value)
    }

    /// Builds and compiles the construction plan. Runs at most once per
    /// producer unless it fails, in which case the next resolution retries.
    fn build(&self, ctx: &ResolutionContext<'_>) -> DiResult<CompiledFactory> {
        let plan = match &self.registration.source {
            RegistrationSource::Instance(value) => ConstructionPlan::Constant(value.clone()),
            RegistrationSource::Factory(factory) => ConstructionPlan::FactoryCall(factory.clone()),
            RegistrationSource::AutoWired => {
                ctx.container.build_plan(&self.registration, ctx.verifying)?
            }
        };
        Ok(ctx.container.compiler().compile(&plan))
    }
}
