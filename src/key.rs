//! Service key types for registry storage and lookup.

use std::any::TypeId;

/// Key for service storage and lookup.
///
/// Keys uniquely identify services in the container's registry, supporting
/// concrete types, trait objects, and keyed variants of both. Keyed variants
/// back the secondary key→factory map used by
/// [`resolve_keyed`](crate::Resolve::resolve_keyed), which falls back to the
/// unkeyed registration when the key is absent.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{ServiceKey, key_of};
///
/// let key = key_of::<String>();
/// assert_eq!(key.display_name(), "alloc::string::String");
/// assert_eq!(key.registration_key(), None);
///
/// let keyed = ServiceKey::of_keyed::<u32>("port");
/// assert_eq!(keyed.registration_key(), Some("port"));
/// ```
#[derive(Debug, Clone)]
pub enum ServiceKey {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Keyed concrete type registration
    TypeKeyed(TypeId, &'static str, &'static str),
    /// Trait object binding key
    ///
    /// Traits have no TypeId, so only the trait name is stored.
    Trait(&'static str),
    /// Keyed trait object registration
    TraitKeyed(&'static str, &'static str),
}

impl ServiceKey {
    /// Creates the key for a concrete service type.
    #[inline(always)]
    pub fn of<T: 'static>() -> Self {
        ServiceKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Creates the key for a trait object service.
    #[inline(always)]
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        ServiceKey::Trait(std::any::type_name::<T>())
    }

    /// Creates a keyed variant for a concrete service type.
    #[inline(always)]
    pub fn of_keyed<T: 'static>(key: &'static str) -> Self {
        ServiceKey::TypeKeyed(TypeId::of::<T>(), std::any::type_name::<T>(), key)
    }

    /// Creates a keyed variant for a trait object service.
    #[inline(always)]
    pub fn of_trait_keyed<T: ?Sized + 'static>(key: &'static str) -> Self {
        ServiceKey::TraitKeyed(std::any::type_name::<T>(), key)
    }

    /// Get the type or trait name for display in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKey::Type(_, name) => name,
            ServiceKey::TypeKeyed(_, name, _) => name,
            ServiceKey::Trait(name) => name,
            ServiceKey::TraitKeyed(name, _) => name,
        }
    }

    /// Get the registration key for keyed registrations, or None.
    pub fn registration_key(&self) -> Option<&'static str> {
        match self {
            ServiceKey::Type(_, _) | ServiceKey::Trait(_) => None,
            ServiceKey::TypeKeyed(_, _, key) => Some(key),
            ServiceKey::TraitKeyed(_, key) => Some(key),
        }
    }

}

// TypeId-only comparison for concrete types on the hot path; the name string
// is derived from the TypeId and carried for diagnostics only.
impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ServiceKey::Type(a, _), ServiceKey::Type(b, _)) => a == b,
            (ServiceKey::TypeKeyed(a, _, ka), ServiceKey::TypeKeyed(b, _, kb)) => {
                a == b && ka == kb
            }
            (ServiceKey::Trait(a), ServiceKey::Trait(b)) => a == b,
            (ServiceKey::TraitKeyed(a, ka), ServiceKey::TraitKeyed(b, kb)) => a == b && ka == kb,
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl std::hash::Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ServiceKey::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            ServiceKey::TypeKeyed(id, _, key) => {
                1u8.hash(state);
                id.hash(state);
                key.hash(state);
            }
            ServiceKey::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            ServiceKey::TraitKeyed(name, key) => {
                3u8.hash(state);
                name.hash(state);
                key.hash(state);
            }
        }
    }
}

/// Helper function for creating concrete type keys.
#[inline(always)]
pub fn key_of<T: 'static>() -> ServiceKey {
    ServiceKey::of::<T>()
}

/// Helper function for creating trait object keys.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> ServiceKey {
    ServiceKey::of_trait::<T>()
}
