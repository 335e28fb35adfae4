//! Read-only registration descriptors for diagnostics and tooling.

use crate::key::ServiceKey;
use crate::lifestyle::Lifestyle;

/// Snapshot of one registration, as reported by
/// [`Container::registrations`](crate::Container::registrations).
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    key: ServiceKey,
    lifestyle: Option<Lifestyle>,
    kind: &'static str,
}

impl ServiceDescriptor {
    pub(crate) fn new(key: ServiceKey, lifestyle: Option<Lifestyle>, kind: &'static str) -> Self {
        Self {
            key,
            lifestyle,
            kind,
        }
    }

    /// The service key this registration is stored under.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// The service's type or trait name.
    pub fn service_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// The registration key for keyed registrations.
    pub fn registration_key(&self) -> Option<&'static str> {
        self.key.registration_key()
    }

    /// The registration's lifestyle; `None` for collections, which have no
    /// lifestyle of their own.
    pub fn lifestyle(&self) -> Option<Lifestyle> {
        self.lifestyle
    }

    /// One of `"instance"`, `"factory"`, `"auto-wired"`, or `"collection"`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}
