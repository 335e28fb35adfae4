//! Error types for the dependency injection container.

use std::fmt;

/// Boxed error type accepted from user factories and construction callbacks.
///
/// Fallible factories return `Result<T, BoxError>`; the container wraps the
/// error into [`DiError::FactoryThrew`] so the original message survives
/// retries unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dependency injection errors
///
/// Represents the error conditions that can occur during service
/// registration, resolution, verification, or scope teardown.
///
/// Configuration-shape errors (`AlreadyLocked`, duplicates, ambiguous or
/// unresolvable constructors) are raised synchronously at registration or
/// first-resolution time and are never retried internally. Construction-time
/// errors (`FactoryThrew`, `NullProduced`, `SelfDependency`) are reproducible:
/// resolving the same faulty registration twice yields the same error, never a
/// spurious cycle error on the second attempt.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, DiError, Resolve};
///
/// let container = Container::new();
/// match container.resolve::<String>() {
///     Err(DiError::NoRegistration(name)) => {
///         assert_eq!(name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Registration was attempted after the container transitioned to Locked
    AlreadyLocked(&'static str),
    /// A non-collection registration already exists for this service type
    DuplicateRegistration(&'static str),
    /// A collection registration already exists for this service type
    DuplicateCollectionRegistration(&'static str),
    /// Service type has no registration and cannot be auto-wired
    NoRegistration(&'static str),
    /// A constructor parameter type could not be satisfied
    UnresolvableParameter {
        /// The service whose constructor requires the parameter
        consumer: &'static str,
        /// The parameter type that could not be resolved
        parameter: &'static str,
    },
    /// Zero or more than one eligible constructor was found
    AmbiguousConstructor {
        /// The service being constructed
        service: &'static str,
        /// How many eligible constructors the type inspector reported
        found: usize,
    },
    /// Direct or indirect cyclic dependency detected on the resolving thread
    SelfDependency(&'static str),
    /// A user factory or constructor callback returned an error (wraps the cause)
    FactoryThrew {
        /// The service whose factory failed
        service: &'static str,
        /// The original error's message
        message: String,
    },
    /// A factory or extensibility hook produced no value
    NullProduced(&'static str),
    /// An extensibility hook produced an instance of an incompatible type
    TypeMismatch(&'static str),
    /// Two unregistered-type observers both claimed the same service type
    MultipleClaims(&'static str),
    /// The scope was already disposed when the operation was attempted
    ScopeDisposed(&'static str),
    /// A scoped service was resolved with no ambient scope
    OutsideScope(&'static str),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::AlreadyLocked(name) => {
                write!(f, "Container is locked; cannot register {}", name)
            }
            DiError::DuplicateRegistration(name) => {
                write!(f, "Service already registered: {}", name)
            }
            DiError::DuplicateCollectionRegistration(name) => {
                write!(f, "Collection already registered for: {}", name)
            }
            DiError::NoRegistration(name) => {
                write!(f, "No registration for {} and it cannot be auto-wired", name)
            }
            DiError::UnresolvableParameter { consumer, parameter } => {
                write!(
                    f,
                    "Constructor of {} has parameter {} which cannot be resolved",
                    consumer, parameter
                )
            }
            DiError::AmbiguousConstructor { service, found } => {
                write!(
                    f,
                    "{} has {} eligible constructors; exactly one is required",
                    service, found
                )
            }
            DiError::SelfDependency(name) => {
                write!(f, "Cyclic dependency detected while constructing {}", name)
            }
            DiError::FactoryThrew { service, message } => {
                write!(f, "Factory for {} failed: {}", service, message)
            }
            DiError::NullProduced(name) => {
                write!(f, "Registration for {} produced no instance", name)
            }
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::MultipleClaims(name) => {
                write!(f, "Multiple unregistered-type observers claimed {}", name)
            }
            DiError::ScopeDisposed(op) => {
                write!(f, "Scope already disposed; cannot {}", op)
            }
            DiError::OutsideScope(name) => {
                write!(f, "Cannot resolve scoped service {} outside an active scope", name)
            }
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
