//! Service lifestyle definitions.

/// Service lifestyles controlling instance caching behavior
///
/// Defines how service instances are created, cached, and shared within
/// the container. Each lifestyle has different caching and synchronization
/// characteristics.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, Lifestyle, Resolve};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let container = Container::new();
/// container
///     .register_factory(Lifestyle::Singleton, |_| Clock)
///     .unwrap();
///
/// let a = container.resolve::<Clock>().unwrap();
/// let b = container.resolve::<Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b)); // Same instance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifestyle {
    /// New instance per resolution, never cached
    ///
    /// Transient services invoke their compiled factory fresh on every
    /// resolution, even within the same scope. No synchronization is needed.
    Transient,
    /// One instance for the container's lifetime, created at most once
    ///
    /// Singleton services build once under a double-checked cell; callers
    /// racing the first build block until it completes, and every caller
    /// afterwards reads the cached value without locking.
    Singleton,
    /// One instance per active scope
    ///
    /// Scoped services are cached in the ambient [`Scope`](crate::Scope).
    /// Resolving a scoped service with no active scope is an error, except
    /// during verification where a throwaway instance is built instead.
    Scoped,
}
