//! Immutable registration records stored in the registry.

use crate::key::ServiceKey;
use crate::lifestyle::Lifestyle;
use crate::plan::DynFactory;
use std::any::Any;
use std::sync::Arc;

use crate::context::ResolutionContext;
use crate::error::DiResult;

/// Type-erased `Arc` used to store any service instance.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Factory for one collection item; `Ok(None)` means the factory produced
/// nothing, which resolution reports as `NullProduced`.
pub(crate) type ItemFactory =
    Arc<dyn for<'a> Fn(&ResolutionContext<'a>) -> DiResult<Option<AnyArc>> + Send + Sync>;

/// How a registration obtains its instances.
pub(crate) enum RegistrationSource {
    /// Build via the type inspector's constructor metadata.
    AutoWired,
    /// Invoke a user-supplied factory.
    Factory(DynFactory),
    /// Hand out a pre-built instance.
    Instance(AnyArc),
}

/// A single service registration. Immutable once created; the registry swaps
/// whole snapshots rather than mutating records in place.
pub(crate) struct Registration {
    pub key: ServiceKey,
    pub lifestyle: Lifestyle,
    pub source: RegistrationSource,
}

impl Registration {
    pub fn kind(&self) -> &'static str {
        match self.source {
            RegistrationSource::AutoWired => "auto-wired",
            RegistrationSource::Factory(_) => "factory",
            RegistrationSource::Instance(_) => "instance",
        }
    }
}

/// An ordered collection registration for one element service type.
pub(crate) struct CollectionRegistration {
    /// Element type name, used in error reporting
    pub item_name: &'static str,
    pub items: Vec<ItemFactory>,
}
