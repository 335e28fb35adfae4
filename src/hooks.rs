//! Unregistered-type observers: claims and the event they observe.

use std::any::TypeId;
use std::sync::Arc;

use crate::context::ResolutionContext;
use crate::error::BoxError;
use crate::key::ServiceKey;
use crate::lifestyle::Lifestyle;
use crate::registration::AnyArc;

/// Handle identifying a subscribed unregistered-type observer, used to
/// unsubscribe it while the container is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(pub(crate) u64);

/// Raised (synchronously, on the resolving thread) when resolution misses
/// both the registry and auto-wiring for a service type.
///
/// Observers inspect the event and may return a [`Claim`] describing how to
/// produce the type. Exactly one observer may claim a given type; two or more
/// claims fail the resolution with `MultipleClaims`.
pub struct UnregisteredTypeEvent {
    pub(crate) key: ServiceKey,
}

impl UnregisteredTypeEvent {
    /// The service key that missed.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// The missing type's name.
    pub fn service_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// True when the missing service is the concrete type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        matches!(&self.key, ServiceKey::Type(id, _) if *id == TypeId::of::<T>())
    }

    /// True when the missing service is the trait object `T`.
    pub fn is_trait<T: ?Sized + 'static>(&self) -> bool {
        matches!(&self.key, ServiceKey::Trait(name) if *name == std::any::type_name::<T>())
    }
}

type ClaimFactory =
    Arc<dyn for<'a> Fn(&ResolutionContext<'a>) -> Result<Option<AnyArc>, BoxError> + Send + Sync>;

/// An observer's answer to an [`UnregisteredTypeEvent`]: how to produce the
/// missing type.
///
/// Claimed factories default to singleton semantics, so the factory runs at
/// most once per claimed type; [`Claim::transient_factory`] opts into a fresh
/// instance per resolution instead.
pub struct Claim {
    pub(crate) lifestyle: Lifestyle,
    pub(crate) produce: ClaimFactory,
}

impl Claim {
    /// Claims the type with a singleton factory.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            lifestyle: Lifestyle::Singleton,
            produce: Arc::new(move |ctx| Ok(Some(Arc::new(factory(ctx)?) as AnyArc))),
        }
    }

    /// Claims the type with a factory invoked on every resolution.
    pub fn transient_factory<T, F>(factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            lifestyle: Lifestyle::Transient,
            produce: Arc::new(move |ctx| Ok(Some(Arc::new(factory(ctx)?) as AnyArc))),
        }
    }

    /// Claims the type with a singleton factory that may decline to produce.
    ///
    /// `Ok(None)` fails the resolution with `NullProduced`.
    pub fn optional_factory<T, F>(factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<Option<T>, BoxError> + Send + Sync + 'static,
    {
        Self {
            lifestyle: Lifestyle::Singleton,
            produce: Arc::new(move |ctx| Ok(factory(ctx)?.map(|v| Arc::new(v) as AnyArc))),
        }
    }

    /// Claims a trait object with a singleton factory.
    pub fn trait_factory<T, F>(factory: F) -> Self
    where
        T: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self {
            lifestyle: Lifestyle::Singleton,
            produce: Arc::new(move |ctx| Ok(Some(Arc::new(factory(ctx)?) as AnyArc))),
        }
    }
}
