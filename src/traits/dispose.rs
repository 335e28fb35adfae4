//! Disposal trait for scope-managed resources.

/// Trait for services requiring cleanup at end of scope.
///
/// Disposables registered with [`Scope::register_for_disposal`](crate::Scope::register_for_disposal)
/// are disposed in reverse registration order when the scope is disposed.
/// Every disposable's `dispose` is attempted even if an earlier one panics;
/// the last panic encountered is re-raised after the teardown completes.
///
/// # Examples
///
/// ```rust
/// use crucible_di::Dispose;
///
/// struct Connection {
///     name: String,
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         println!("closing {}", self.name);
///     }
/// }
/// ```
pub trait Dispose: Send + Sync {
    /// Releases the resources held by this service.
    fn dispose(&self);
}
