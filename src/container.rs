//! The two-phase dependency injection container.
//!
//! A container starts Open: registrations, observers, and initializers may be
//! added freely. The first resolution (or an explicit [`Container::lock`])
//! transitions it to Locked, permanently: further registration attempts fail
//! with `AlreadyLocked`, while resolution proceeds against lock-free registry
//! snapshots. Verification is the one exception; it exercises every
//! registration without changing phase.

use std::any::TypeId;
use std::sync::{Arc, Mutex};

use crate::context::ResolutionContext;
use crate::descriptors::ServiceDescriptor;
use crate::error::{BoxError, DiError, DiResult};
use crate::hooks::{Claim, ObserverId, UnregisteredTypeEvent};
use crate::inspector::{DescriptorInspector, TypeInspector};
use crate::key::ServiceKey;
use crate::lifestyle::Lifestyle;
use crate::plan::{ClosureCompiler, ConstructionPlan, DynFactory, PlanCompiler};
use crate::producer::Producer;
use crate::registration::{
    AnyArc, CollectionRegistration, ItemFactory, Registration, RegistrationSource,
};
use crate::registry::Registry;
use crate::scope::Scope;
use crate::traits::{Resolve, ResolverCore};

type ObserverFn = Arc<dyn Fn(&UnregisteredTypeEvent) -> Option<Claim> + Send + Sync>;
type InitializerFn = Arc<dyn Fn(&AnyArc) + Send + Sync>;

/// The dependency injection container.
///
/// Cheaply cloneable handle; clones share the same registry, singletons, and
/// extensibility hooks.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, Lifestyle, Resolve};
///
/// struct Config {
///     url: &'static str,
/// }
///
/// let container = Container::new();
/// container.register_instance(Config { url: "localhost" }).unwrap();
///
/// let config = container.resolve::<Config>().unwrap();
/// assert_eq!(config.url, "localhost");
///
/// // The first resolution locked the container.
/// assert!(container.register_instance(Config { url: "other" }).is_err());
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    registry: Registry,
    inspector: Arc<dyn TypeInspector>,
    descriptors: Arc<DescriptorInspector>,
    compiler: Arc<dyn PlanCompiler>,
    observers: Mutex<Vec<(ObserverId, ObserverFn)>>,
    next_observer: std::sync::atomic::AtomicU64,
    initializers: Mutex<Vec<(TypeId, InitializerFn)>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates a container with the default descriptor-registry inspector
    /// and the closure-composing plan compiler.
    pub fn new() -> Self {
        let descriptors = Arc::new(DescriptorInspector::new());
        Self::build(descriptors.clone(), descriptors, Arc::new(ClosureCompiler))
    }

    /// Creates a container with a custom type inspector and plan compiler.
    ///
    /// The default descriptor registry returned by
    /// [`inspector`](Self::inspector) is not consulted when a custom
    /// inspector is supplied here.
    pub fn with_parts(inspector: Arc<dyn TypeInspector>, compiler: Arc<dyn PlanCompiler>) -> Self {
        Self::build(inspector, Arc::new(DescriptorInspector::new()), compiler)
    }

    fn build(
        inspector: Arc<dyn TypeInspector>,
        descriptors: Arc<DescriptorInspector>,
        compiler: Arc<dyn PlanCompiler>,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: Registry::new(),
                inspector,
                descriptors,
                compiler,
                observers: Mutex::new(Vec::new()),
                next_observer: std::sync::atomic::AtomicU64::new(0),
                initializers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The default descriptor registry, used to describe constructors and
    /// injectable properties for auto-wiring.
    pub fn inspector(&self) -> &DescriptorInspector {
        &self.inner.descriptors
    }

    /// Registers `T` for auto-wiring through the type inspector.
    pub fn register<T: 'static + Send + Sync>(&self, lifestyle: Lifestyle) -> DiResult<()> {
        self.register_with(ServiceKey::of::<T>(), lifestyle, RegistrationSource::AutoWired)
    }

    /// Registers a factory for `T`.
    pub fn register_factory<T, F>(&self, lifestyle: Lifestyle, factory: F) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> T + Send + Sync + 'static,
    {
        let wrapped: DynFactory = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as AnyArc));
        self.register_with(
            ServiceKey::of::<T>(),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a fallible factory for `T`.
    ///
    /// Factory errors surface as `FactoryThrew` carrying the original
    /// message; resolving the same faulty registration again reproduces the
    /// same error.
    pub fn register_try_factory<T, F>(&self, lifestyle: Lifestyle, factory: F) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let service = std::any::type_name::<T>();
        let wrapped: DynFactory = Arc::new(move |ctx| {
            factory(ctx)
                .map(|v| Arc::new(v) as AnyArc)
                .map_err(|e| match e.downcast::<DiError>() {
                    Ok(di) => *di,
                    Err(e) => DiError::FactoryThrew {
                        service,
                        message: e.to_string(),
                    },
                })
        });
        self.register_with(
            ServiceKey::of::<T>(),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a pre-built singleton instance.
    pub fn register_instance<T: 'static + Send + Sync>(&self, value: T) -> DiResult<()> {
        self.register_with(
            ServiceKey::of::<T>(),
            Lifestyle::Singleton,
            RegistrationSource::Instance(Arc::new(value)),
        )
    }

    /// Registers a factory for the trait object `T`.
    pub fn register_trait_factory<T, F>(&self, lifestyle: Lifestyle, factory: F) -> DiResult<()>
    where
        T: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let wrapped: DynFactory = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as AnyArc));
        self.register_with(
            ServiceKey::of_trait::<T>(),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a fallible factory for the trait object `T`.
    pub fn register_trait_try_factory<T, F>(&self, lifestyle: Lifestyle, factory: F) -> DiResult<()>
    where
        T: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let service = std::any::type_name::<T>();
        let wrapped: DynFactory = Arc::new(move |ctx| {
            factory(ctx)
                .map(|v| Arc::new(v) as AnyArc)
                .map_err(|e| match e.downcast::<DiError>() {
                    Ok(di) => *di,
                    Err(e) => DiError::FactoryThrew {
                        service,
                        message: e.to_string(),
                    },
                })
        });
        self.register_with(
            ServiceKey::of_trait::<T>(),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a pre-built trait object instance as a singleton.
    pub fn register_trait_instance<T: ?Sized + 'static + Send + Sync>(
        &self,
        value: Arc<T>,
    ) -> DiResult<()> {
        self.register_with(
            ServiceKey::of_trait::<T>(),
            Lifestyle::Singleton,
            RegistrationSource::Instance(Arc::new(value)),
        )
    }

    /// Registers a keyed factory for `T`.
    ///
    /// Keyed registrations live alongside unkeyed ones; typed keyed
    /// resolution falls back to the unkeyed registration when the key is
    /// absent.
    pub fn register_keyed_factory<T, F>(
        &self,
        key: &'static str,
        lifestyle: Lifestyle,
        factory: F,
    ) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> T + Send + Sync + 'static,
    {
        let wrapped: DynFactory = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as AnyArc));
        self.register_with(
            ServiceKey::of_keyed::<T>(key),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a fallible keyed factory for `T`.
    pub fn register_keyed_try_factory<T, F>(
        &self,
        key: &'static str,
        lifestyle: Lifestyle,
        factory: F,
    ) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let service = std::any::type_name::<T>();
        let wrapped: DynFactory = Arc::new(move |ctx| {
            factory(ctx)
                .map(|v| Arc::new(v) as AnyArc)
                .map_err(|e| match e.downcast::<DiError>() {
                    Ok(di) => *di,
                    Err(e) => DiError::FactoryThrew {
                        service,
                        message: e.to_string(),
                    },
                })
        });
        self.register_with(
            ServiceKey::of_keyed::<T>(key),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    /// Registers a keyed factory for the trait object `T`.
    pub fn register_keyed_trait_factory<T, F>(
        &self,
        key: &'static str,
        lifestyle: Lifestyle,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let wrapped: DynFactory = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as AnyArc));
        self.register_with(
            ServiceKey::of_trait_keyed::<T>(key),
            lifestyle,
            RegistrationSource::Factory(wrapped),
        )
    }

    fn register_with(
        &self,
        key: ServiceKey,
        lifestyle: Lifestyle,
        source: RegistrationSource,
    ) -> DiResult<()> {
        let producer = Arc::new(Producer::new(Registration {
            key: key.clone(),
            lifestyle,
            source,
        }));
        self.inner
            .registry
            .insert_registered(key.display_name(), key, producer)
    }

    /// Registers an ordered collection of pre-built items for `T`.
    pub fn register_collection<T: 'static + Send + Sync>(
        &self,
        items: Vec<Arc<T>>,
    ) -> DiResult<()> {
        let factories = items
            .into_iter()
            .map(|item| {
                let item = item as AnyArc;
                Arc::new(move |_: &ResolutionContext<'_>| Ok(Some(item.clone()))) as ItemFactory
            })
            .collect();
        self.register_collection_with(ServiceKey::of::<T>(), factories)
    }

    /// Registers an ordered collection of item factories for `T`.
    ///
    /// Each factory may decline to produce; `Ok(None)` fails collection
    /// resolution with `NullProduced`.
    pub fn register_collection_factories<T, F>(&self, factories: Vec<F>) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolutionContext<'_>) -> Result<Option<T>, BoxError> + Send + Sync + 'static,
    {
        let service = std::any::type_name::<T>();
        let factories = factories
            .into_iter()
            .map(|factory| {
                Arc::new(move |ctx: &ResolutionContext<'_>| {
                    factory(ctx)
                        .map(|opt| opt.map(|v| Arc::new(v) as AnyArc))
                        .map_err(|e| DiError::FactoryThrew {
                            service,
                            message: e.to_string(),
                        })
                }) as ItemFactory
            })
            .collect();
        self.register_collection_with(ServiceKey::of::<T>(), factories)
    }

    /// Registers an ordered collection of trait object items for `T`.
    pub fn register_trait_collection<T: ?Sized + 'static + Send + Sync>(
        &self,
        items: Vec<Arc<T>>,
    ) -> DiResult<()> {
        let factories = items
            .into_iter()
            .map(|item| {
                let item = Arc::new(item) as AnyArc;
                Arc::new(move |_: &ResolutionContext<'_>| Ok(Some(item.clone()))) as ItemFactory
            })
            .collect();
        self.register_collection_with(ServiceKey::of_trait::<T>(), factories)
    }

    fn register_collection_with(
        &self,
        key: ServiceKey,
        items: Vec<ItemFactory>,
    ) -> DiResult<()> {
        let collection = Arc::new(CollectionRegistration {
            item_name: key.display_name(),
            items,
        });
        self.inner
            .registry
            .insert_collection(key.display_name(), key, collection)
    }

    /// Adds an observer consulted when resolution misses both the registry
    /// and auto-wiring.
    ///
    /// Observers run synchronously on the resolving thread, in the order
    /// added. Exactly one may claim a type; multiple claims fail the
    /// resolution with `MultipleClaims`. The returned handle unsubscribes
    /// via [`remove_unregistered_type_observer`](Self::remove_unregistered_type_observer).
    pub fn on_unregistered_type<F>(&self, observer: F) -> DiResult<ObserverId>
    where
        F: Fn(&UnregisteredTypeEvent) -> Option<Claim> + Send + Sync + 'static,
    {
        if self.inner.registry.is_locked() {
            return Err(DiError::AlreadyLocked("unregistered-type observer"));
        }
        let id = ObserverId(
            self.inner
                .next_observer
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst),
        );
        self.inner
            .observers
            .lock()
            .unwrap()
            .push((id, Arc::new(observer)));
        Ok(id)
    }

    /// Removes a previously subscribed unregistered-type observer.
    ///
    /// Like subscription, this fails once the container is locked. Removing
    /// an already removed observer is a no-op.
    pub fn remove_unregistered_type_observer(&self, id: ObserverId) -> DiResult<()> {
        if self.inner.registry.is_locked() {
            return Err(DiError::AlreadyLocked("unregistered-type observer"));
        }
        self.inner
            .observers
            .lock()
            .unwrap()
            .retain(|(oid, _)| *oid != id);
        Ok(())
    }

    /// Adds an initializer run against every produced instance of `T`, in
    /// the order added, before the instance is handed to its consumer.
    pub fn register_initializer<T, F>(&self, initializer: F) -> DiResult<()>
    where
        T: 'static + Send + Sync,
        F: Fn(&T) + Send + Sync + 'static,
    {
        if self.inner.registry.is_locked() {
            return Err(DiError::AlreadyLocked("instance initializer"));
        }
        let apply: InitializerFn = Arc::new(move |any| {
            if let Some(value) = any.downcast_ref::<T>() {
                initializer(value);
            }
        });
        self.inner
            .initializers
            .lock()
            .unwrap()
            .push((TypeId::of::<T>(), apply));
        Ok(())
    }

    /// Explicitly transitions the container to the Locked phase.
    ///
    /// One-way and idempotent; the first resolution does this implicitly.
    pub fn lock(&self) {
        self.inner.registry.lock();
    }

    /// True once the container has transitioned to the Locked phase.
    pub fn is_locked(&self) -> bool {
        self.inner.registry.is_locked()
    }

    /// Creates a new scope backed by this container.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Descriptors for every current registration, sorted by service name.
    pub fn registrations(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .inner
            .registry
            .snapshot()
            .values()
            .map(|producer| {
                let registration = producer.registration();
                ServiceDescriptor::new(
                    registration.key.clone(),
                    Some(registration.lifestyle),
                    registration.kind(),
                )
            })
            .collect();
        descriptors.extend(
            self.inner
                .registry
                .collections_snapshot()
                .keys()
                .map(|key| ServiceDescriptor::new(key.clone(), None, "collection")),
        );
        descriptors.sort_by_key(|d| (d.service_name(), d.registration_key(), d.kind()));
        descriptors
    }

    /// Multi-line dump of the current registrations, for debugging.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::from("Container registrations:\n");
        for descriptor in self.registrations() {
            let _ = write!(out, "  {} [{}]", descriptor.service_name(), descriptor.kind());
            if let Some(key) = descriptor.registration_key() {
                let _ = write!(out, " key={}", key);
            }
            if let Some(lifestyle) = descriptor.lifestyle() {
                let _ = write!(out, " ({:?})", lifestyle);
            }
            out.push('\n');
        }
        out
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &ServiceKey) -> DiResult<AnyArc> {
        self.inner.resolve_key(key, None, false)
    }

    fn resolve_all_any(&self, key: &ServiceKey) -> DiResult<Vec<AnyArc>> {
        self.inner.resolve_all_key(key, None, false)
    }
}

impl Resolve for Container {}

impl ContainerInner {
    pub(crate) fn compiler(&self) -> &Arc<dyn PlanCompiler> {
        &self.compiler
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves one service. The first non-verifying call latches the
    /// container into the Locked phase.
    pub(crate) fn resolve_key(
        &self,
        key: &ServiceKey,
        scope: Option<&Scope>,
        verifying: bool,
    ) -> DiResult<AnyArc> {
        if !verifying {
            self.registry.lock();
        }
        let producer = self.producer_for(key, verifying)?;
        let ctx = ResolutionContext {
            container: self,
            scope,
            verifying,
        };
        producer.get_instance(&ctx)
    }

    /// Resolves the registered collection for `key`; no registration means
    /// an empty collection, not an error.
    pub(crate) fn resolve_all_key(
        &self,
        key: &ServiceKey,
        scope: Option<&Scope>,
        verifying: bool,
    ) -> DiResult<Vec<AnyArc>> {
        if !verifying {
            self.registry.lock();
        }
        let collections = self.registry.collections_snapshot();
        let collection = match collections.get(key) {
            Some(collection) => collection,
            None => return Ok(Vec::new()),
        };
        let ctx = ResolutionContext {
            container: self,
            scope,
            verifying,
        };
        let mut items = Vec::with_capacity(collection.items.len());
        for item in &collection.items {
            match item(&ctx)? {
                Some(value) => items.push(value),
                None => return Err(DiError::NullProduced(collection.item_name)),
            }
        }
        Ok(items)
    }

    /// Finds or creates the producer for `key`.
    ///
    /// Misses fall through three stages: registry snapshot, unregistered-type
    /// observers, auto-wiring. Keyed misses fail immediately so typed keyed
    /// resolution can fall back to the unkeyed registration.
    ///
    /// Under verification, just-in-time producers are throwaways and never
    /// installed: verifying must leave the registry exactly as it found it,
    /// so every type stays registrable afterwards.
    pub(crate) fn producer_for(
        &self,
        key: &ServiceKey,
        verifying: bool,
    ) -> DiResult<Arc<Producer>> {
        if let Some(producer) = self.registry.snapshot().get(key) {
            return Ok(producer.clone());
        }
        if key.registration_key().is_some() {
            return Err(DiError::NoRegistration(key.display_name()));
        }

        // Every observer sees the event even after one claims, so that two
        // competing claims are detected rather than silently ordered.
        let observers: Vec<ObserverFn> = self
            .observers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        if !observers.is_empty() {
            let event = UnregisteredTypeEvent { key: key.clone() };
            let mut claims: Vec<Claim> = observers
                .iter()
                .filter_map(|observer| observer(&event))
                .collect();
            match claims.len() {
                0 => {}
                1 => {
                    let registration = claim_registration(key.clone(), claims.remove(0));
                    let producer = Arc::new(Producer::new(registration));
                    if verifying {
                        return Ok(producer);
                    }
                    return Ok(self.registry.install(key.clone(), producer));
                }
                _ => return Err(DiError::MultipleClaims(key.display_name())),
            }
        }

        // Unregistered concrete types auto-wire as transients when the
        // inspector knows exactly one constructor for them.
        if matches!(key, ServiceKey::Type(_, _)) {
            match self.inspector.constructors(key).len() {
                0 => Err(DiError::NoRegistration(key.display_name())),
                1 => {
                    let producer = Arc::new(Producer::new(Registration {
                        key: key.clone(),
                        lifestyle: Lifestyle::Transient,
                        source: RegistrationSource::AutoWired,
                    }));
                    if verifying {
                        Ok(producer)
                    } else {
                        Ok(self.registry.install(key.clone(), producer))
                    }
                }
                found => Err(DiError::AmbiguousConstructor {
                    service: key.display_name(),
                    found,
                }),
            }
        } else {
            Err(DiError::NoRegistration(key.display_name()))
        }
    }

    /// Builds the construction plan for an auto-wired registration.
    pub(crate) fn build_plan(
        &self,
        registration: &Registration,
        verifying: bool,
    ) -> DiResult<ConstructionPlan> {
        let key = &registration.key;
        let service = key.display_name();
        let mut constructors = self.inspector.constructors(key);
        if constructors.len() != 1 {
            return Err(DiError::AmbiguousConstructor {
                service,
                found: constructors.len(),
            });
        }
        let constructor = constructors.remove(0);

        let mut arguments = Vec::with_capacity(constructor.parameters().len());
        for parameter in constructor.parameters() {
            arguments.push(self.dependency_plan(service, parameter, verifying)?);
        }
        let mut properties = Vec::new();
        for property in self.inspector.injectable_properties(key) {
            let plan = self.dependency_plan(service, property.dependency(), verifying)?;
            properties.push((property, plan));
        }

        Ok(ConstructionPlan::New {
            service,
            constructor,
            arguments,
            properties,
        })
    }

    fn dependency_plan(
        &self,
        consumer: &'static str,
        dependency: &ServiceKey,
        verifying: bool,
    ) -> DiResult<ConstructionPlan> {
        let producer = self.producer_for(dependency, verifying).map_err(|e| match e {
            DiError::NoRegistration(parameter) => DiError::UnresolvableParameter {
                consumer,
                parameter,
            },
            other => other,
        })?;
        Ok(ConstructionPlan::FactoryCall(Arc::new(move |ctx| {
            producer.get_instance(ctx)
        })))
    }

    /// Runs every initializer registered for the key's concrete type, in
    /// the order added.
    pub(crate) fn apply_initializers(&self, key: &ServiceKey, value: &AnyArc) {
        let id = match key {
            ServiceKey::Type(id, _) | ServiceKey::TypeKeyed(id, _, _) => *id,
            _ => return,
        };
        // Snapshot outside the lock so an initializer resolving through the
        // container cannot deadlock against hook registration.
        let matching: Vec<InitializerFn> = self
            .initializers
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == id)
            .map(|(_, f)| f.clone())
            .collect();
        for initializer in matching {
            initializer(value);
        }
    }
}

fn claim_registration(key: ServiceKey, claim: Claim) -> Registration {
    let service = key.display_name();
    let produce = claim.produce;
    let factory: DynFactory = Arc::new(move |ctx| match produce(ctx) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(DiError::NullProduced(service)),
        // Dependency errors raised inside the claim keep their own kind.
        Err(e) => Err(match e.downcast::<DiError>() {
            Ok(di) => *di,
            Err(e) => DiError::FactoryThrew {
                service,
                message: e.to_string(),
            },
        }),
    });
    Registration {
        key,
        lifestyle: claim.lifestyle,
        source: RegistrationSource::Factory(factory),
    }
}
