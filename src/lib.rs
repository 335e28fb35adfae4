//! # crucible-di
//!
//! A two-phase dependency injection container with lock-free resolution.
//!
//! A [`Container`] starts in the Open phase, where services are registered
//! under one of three [`Lifestyle`]s. The first resolution (or an explicit
//! [`Container::lock`]) transitions it, permanently, to the Locked phase:
//! registration is rejected from then on and resolution runs against
//! copy-on-write registry snapshots, so concurrent resolutions never contend
//! with each other.
//!
//! # Quick start
//!
//! ```rust
//! use crucible_di::{Container, Lifestyle, Resolve};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct StdoutLogger;
//! impl Logger for StdoutLogger {
//!     fn log(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! struct Service {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_trait_factory::<dyn Logger, _>(Lifestyle::Singleton, |_| Arc::new(StdoutLogger))
//!     .unwrap();
//! container
//!     .register_try_factory(Lifestyle::Transient, |ctx| {
//!         Ok(Service {
//!             logger: ctx.resolve_trait::<dyn Logger>()?,
//!         })
//!     })
//!     .unwrap();
//!
//! let service = container.resolve::<Service>().unwrap();
//! service.logger.log("resolved");
//! ```
//!
//! # Lifestyles
//!
//! - [`Lifestyle::Transient`] — a fresh instance per resolution.
//! - [`Lifestyle::Singleton`] — one instance for the container's lifetime,
//!   built at most once even under concurrent first resolution.
//! - [`Lifestyle::Scoped`] — one instance per [`Scope`]; resolution outside a
//!   scope is an error.
//!
//! # Scopes and teardown
//!
//! [`Container::create_scope`] opens a bounded lifetime region. Scoped
//! services are cached per scope; [`Scope::when_scope_ends`] schedules
//! teardown actions and [`Scope::register_for_disposal`] registers
//! [`Dispose`] implementors that are disposed in reverse registration order
//! when the scope is disposed.
//!
//! # Auto-wiring
//!
//! Rust has no runtime reflection, so constructor discovery goes through a
//! pluggable [`TypeInspector`]. The default [`DescriptorInspector`] is a
//! registry of [`ConstructorDescriptor`]s; the container builds a
//! [`ConstructionPlan`] from them and a [`PlanCompiler`] turns the plan into
//! a reusable factory. Cycles are caught at resolution time and reported as
//! [`DiError::SelfDependency`] rather than overflowing the stack.
//!
//! # Verification
//!
//! [`Container::verify`] exercises every registration and collection once,
//! aggregating all failures into a [`VerificationError`] instead of stopping
//! at the first, and leaves the container's phase untouched.

#![warn(missing_docs)]

mod container;
mod context;
mod descriptors;
mod error;
mod hooks;
mod inspector;
mod internal;
mod key;
mod lifestyle;
mod plan;
mod producer;
mod registration;
mod registry;
mod scope;
mod traits;
mod verifier;

pub use container::Container;
pub use context::ResolutionContext;
pub use descriptors::ServiceDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use hooks::{Claim, ObserverId, UnregisteredTypeEvent};
pub use inspector::{
    ConstructorDescriptor, DescriptorInspector, PropertyDescriptor, ResolvedArgs, TypeInspector,
};
pub use key::{key_of, key_of_trait, ServiceKey};
pub use lifestyle::Lifestyle;
pub use plan::{ClosureCompiler, CompiledFactory, ConstructionPlan, DynFactory, PlanCompiler};
pub use registration::AnyArc;
pub use scope::Scope;
pub use traits::{Dispose, Resolve, ResolverCore};
pub use verifier::VerificationError;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter {
        builds: Arc<AtomicUsize>,
    }

    #[test]
    fn singleton_is_shared() {
        let builds = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        let b = builds.clone();
        container
            .register_factory(Lifestyle::Singleton, move |_| {
                b.fetch_add(1, Ordering::SeqCst);
                Counter { builds: b.clone() }
            })
            .unwrap();

        let first = container.resolve::<Counter>().unwrap();
        let second = container.resolve::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(first.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_is_fresh_per_resolution() {
        let container = Container::new();
        container
            .register_factory(Lifestyle::Transient, |_| String::from("x"))
            .unwrap();

        let first = container.resolve::<String>().unwrap();
        let second = container.resolve::<String>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn scoped_requires_a_scope() {
        let container = Container::new();
        container
            .register_factory(Lifestyle::Scoped, |_| 7u32)
            .unwrap();

        assert!(matches!(
            container.resolve::<u32>(),
            Err(DiError::OutsideScope(_))
        ));

        let scope = container.create_scope();
        let a = scope.resolve::<u32>().unwrap();
        let b = scope.resolve::<u32>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        scope.dispose();
    }

    #[test]
    fn first_resolution_locks() {
        let container = Container::new();
        container.register_instance(1u8).unwrap();
        assert!(!container.is_locked());

        let _ = container.resolve::<u8>().unwrap();
        assert!(container.is_locked());
        assert_eq!(
            container.register_instance(2u8),
            Err(DiError::AlreadyLocked("u8"))
        );
    }
}
