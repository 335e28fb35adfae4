//! Explicit resolution context threaded through factories and plans.

use crate::container::ContainerInner;
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::registration::AnyArc;
use crate::scope::Scope;
use crate::traits::{Resolve, ResolverCore};

/// Per-resolution state handed to factories and compiled plans.
///
/// Carries the container, the ambient scope (if any), and whether the
/// resolution runs under verification. State flows through this explicit
/// parameter rather than thread-local storage, so factories stay honest about
/// what they depend on and resolution works the same from any thread.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, Lifestyle, Resolve};
/// use std::sync::Arc;
///
/// struct Engine;
/// struct Car {
///     engine: Arc<Engine>,
/// }
///
/// let container = Container::new();
/// container.register_factory(Lifestyle::Singleton, |_| Engine).unwrap();
/// container
///     .register_try_factory(Lifestyle::Transient, |ctx| {
///         Ok(Car {
///             engine: ctx.resolve::<Engine>()?,
///         })
///     })
///     .unwrap();
///
/// let car = container.resolve::<Car>().unwrap();
/// assert!(Arc::strong_count(&car.engine) >= 2);
/// ```
pub struct ResolutionContext<'a> {
    pub(crate) container: &'a ContainerInner,
    pub(crate) scope: Option<&'a Scope>,
    pub(crate) verifying: bool,
}

impl<'a> ResolutionContext<'a> {
    /// True while the container is verifying registrations rather than
    /// serving a real resolution.
    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// The scope this resolution runs inside, if any.
    pub fn scope(&self) -> Option<&Scope> {
        self.scope
    }
}

impl ResolverCore for ResolutionContext<'_> {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.container.resolve_key(key, self.scope, self.verifying)
    }

    fn resolve_all_any(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.container
            .resolve_all_key(key, self.scope, self.verifying)
    }
}

impl Resolve for ResolutionContext<'_> {}
