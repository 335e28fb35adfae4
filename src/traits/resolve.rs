//! Resolver traits shared by the container, scopes, and resolution contexts.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::registration::AnyArc;

pub(crate) fn downcast<T: 'static + Send + Sync>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored double-wrapped (Arc<Arc<dyn Trait>> inside the
// type-erased Arc) because Arc<dyn Trait> itself is not a sized Any payload.
pub(crate) fn downcast_trait<T: ?Sized + 'static + Send + Sync>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Core resolver trait for object-safe, type-erased service resolution.
///
/// Implemented by [`Container`](crate::Container), [`Scope`](crate::Scope),
/// and [`ResolutionContext`](crate::ResolutionContext). Most users should use
/// the [`Resolve`] trait instead, which provides typed methods built on top of
/// this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service as a type-erased `Arc`.
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc>;

    /// Resolves the registered collection for a service type.
    ///
    /// Returns an empty vector when no collection is registered — never an
    /// error for the missing-collection case.
    fn resolve_all_any(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>>;
}

/// Typed resolution surface shared by the container, scopes, and factory
/// contexts.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, Lifestyle, Resolve};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_trait_factory::<dyn Greeter, _>(Lifestyle::Singleton, |_| Arc::new(English))
///     .unwrap();
///
/// let greeter = container.resolve_trait::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub trait Resolve: ResolverCore {
    /// Resolves a concrete service type.
    fn resolve<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast::<T>(self.resolve_any(&ServiceKey::of::<T>())?)
    }

    /// Resolves a trait object service.
    fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_any(&ServiceKey::of_trait::<T>())?)
    }

    /// Resolves a keyed registration, falling back to the unkeyed
    /// registration when no registration exists under the key.
    fn resolve_keyed<T: 'static + Send + Sync>(&self, key: &'static str) -> DiResult<Arc<T>> {
        match self.resolve_any(&ServiceKey::of_keyed::<T>(key)) {
            // Only a missing keyed registration for T itself falls back; a
            // missing dependency of the keyed factory keeps its own error.
            Err(DiError::NoRegistration(name)) if name == std::any::type_name::<T>() => {
                self.resolve::<T>()
            }
            other => downcast::<T>(other?),
        }
    }

    /// Keyed trait-object resolution with the same unkeyed fallback.
    fn resolve_keyed_trait<T: ?Sized + 'static + Send + Sync>(
        &self,
        key: &'static str,
    ) -> DiResult<Arc<T>> {
        match self.resolve_any(&ServiceKey::of_trait_keyed::<T>(key)) {
            Err(DiError::NoRegistration(name)) if name == std::any::type_name::<T>() => {
                self.resolve_trait::<T>()
            }
            other => downcast_trait::<T>(other?),
        }
    }

    /// Resolves all items of the registered collection for `T`.
    ///
    /// Returns an empty vector when no collection was registered.
    fn resolve_all<T: 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_any(&ServiceKey::of::<T>())?
            .into_iter()
            .map(downcast::<T>)
            .collect()
    }

    /// Resolves all items of the registered trait-object collection for `T`.
    fn resolve_all_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_any(&ServiceKey::of_trait::<T>())?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }
}
