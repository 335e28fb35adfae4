//! Scopes: bounded lifetime regions with cached instances and ordered
//! teardown.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::registration::AnyArc;
use crate::traits::{Dispose, Resolve, ResolverCore};

const ACTIVE: u8 = 0;
const DISPOSING: u8 = 1;
const DISPOSED: u8 = 2;

type ScopeAction = Box<dyn FnOnce() + Send>;

/// A bounded lifetime region.
///
/// Scoped services resolved through a scope are cached for its lifetime and
/// shared by everything resolving through it. Disposal runs scheduled
/// teardown actions in registration order, then disposes registered
/// disposables in reverse registration order; actions scheduled during
/// teardown still run before disposal completes.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, Lifestyle, Resolve};
///
/// struct RequestId(u64);
///
/// let container = Container::new();
/// container
///     .register_factory(Lifestyle::Scoped, |_| RequestId(42))
///     .unwrap();
///
/// let scope = container.create_scope();
/// let a = scope.resolve::<RequestId>().unwrap();
/// let b = scope.resolve::<RequestId>().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// scope.dispose();
/// ```
pub struct Scope {
    container: Container,
    cache: Mutex<HashMap<ServiceKey, AnyArc>>,
    actions: Mutex<Vec<ScopeAction>>,
    disposables: Mutex<Vec<Arc<dyn Dispose>>>,
    state: AtomicU8,
}

impl Scope {
    pub(crate) fn new(container: Container) -> Self {
        Self {
            container,
            cache: Mutex::new(HashMap::new()),
            actions: Mutex::new(Vec::new()),
            disposables: Mutex::new(Vec::new()),
            state: AtomicU8::new(ACTIVE),
        }
    }

    /// The container this scope was created from.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Schedules an action to run when the scope is disposed.
    ///
    /// Actions run in the order scheduled, before any disposables. Scheduling
    /// during teardown is allowed; the action still runs in the same
    /// teardown. Fails with `ScopeDisposed` once teardown has completed.
    pub fn when_scope_ends<F>(&self, action: F) -> DiResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state.load(Ordering::SeqCst) == DISPOSED {
            return Err(DiError::ScopeDisposed("schedule a scope-end action"));
        }
        self.actions.lock().unwrap().push(Box::new(action));
        Ok(())
    }

    /// Registers a disposable to be disposed when the scope ends.
    ///
    /// Disposables are disposed in reverse registration order. Every
    /// disposable's `dispose` is attempted even if an earlier one panics.
    pub fn register_for_disposal(&self, disposable: Arc<dyn Dispose>) -> DiResult<()> {
        if self.state.load(Ordering::SeqCst) == DISPOSED {
            return Err(DiError::ScopeDisposed("register a disposable"));
        }
        self.disposables.lock().unwrap().push(disposable);
        Ok(())
    }

    /// True once [`dispose`](Self::dispose) has completed.
    pub fn is_disposed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == DISPOSED
    }

    /// Runs teardown: scheduled actions in order, then disposables in
    /// reverse order. Idempotent; a second call is a no-op.
    ///
    /// Panics from actions or disposables do not stop the teardown. The last
    /// panic payload is re-raised after every action and disposable has run.
    pub fn dispose(&self) {
        if self
            .state
            .compare_exchange(ACTIVE, DISPOSING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let mut last_panic = None;
        loop {
            let actions = std::mem::take(&mut *self.actions.lock().unwrap());
            let disposables = std::mem::take(&mut *self.disposables.lock().unwrap());
            if actions.is_empty() && disposables.is_empty() {
                break;
            }
            for action in actions {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
                    last_panic = Some(payload);
                }
            }
            for disposable in disposables.into_iter().rev() {
                if let Err(payload) =
                    panic::catch_unwind(AssertUnwindSafe(|| disposable.dispose()))
                {
                    last_panic = Some(payload);
                }
            }
        }
        self.cache.lock().unwrap().clear();
        self.state.store(DISPOSED, Ordering::SeqCst);

        if let Some(payload) = last_panic {
            panic::resume_unwind(payload);
        }
    }

    /// Returns the cached instance for `key`, building it via `build` on a
    /// miss. When two threads race to build the same key, the first cached
    /// instance wins and both threads observe it.
    pub(crate) fn get_or_create(
        &self,
        key: &ServiceKey,
        build: impl FnOnce() -> DiResult<AnyArc>,
    ) -> DiResult<AnyArc> {
        if self.state.load(Ordering::SeqCst) != ACTIVE {
            return Err(DiError::ScopeDisposed("resolve"));
        }
        if let Some(cached) = self.cache.lock().unwrap().get(key) {
            return Ok(cached.clone());
        }
        // Build outside the cache lock: construction may recursively resolve
        // other scoped services through this same scope.
        let value = build()?;
        let mut cache = self.cache.lock().unwrap();
        Ok(cache.entry(key.clone()).or_insert(value).clone())
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        if self.state.load(Ordering::SeqCst) != ACTIVE {
            return Err(DiError::ScopeDisposed("resolve"));
        }
        self.container.inner.resolve_key(key, Some(self), false)
    }

    fn resolve_all_any(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        if self.state.load(Ordering::SeqCst) != ACTIVE {
            return Err(DiError::ScopeDisposed("resolve"));
        }
        self.container.inner.resolve_all_key(key, Some(self), false)
    }
}

impl Resolve for Scope {}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.state.load(Ordering::SeqCst) == ACTIVE
            && (!self.actions.lock().unwrap().is_empty()
                || !self.disposables.lock().unwrap().is_empty())
        {
            eprintln!("scope dropped without dispose(); scheduled teardown was skipped");
        }
    }
}
