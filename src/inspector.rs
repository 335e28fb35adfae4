//! Type inspector capability: constructor and property metadata per type.
//!
//! Rust has no runtime reflection, so constructor discovery is a pluggable
//! capability: a [`TypeInspector`] yields [`ConstructorDescriptor`]s describing
//! how to build a value of a type and which service keys its parameters
//! resolve through. The default [`DescriptorInspector`] is a registry that
//! types are described to explicitly; hosts with code generation or macro
//! based registration can substitute their own inspector.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{BoxError, DiError, DiResult};
use crate::key::ServiceKey;
use crate::registration::AnyArc;

/// Positional, type-erased constructor arguments.
///
/// Passed to the construction callback of a [`ConstructorDescriptor`]; each
/// slot holds the resolved dependency for the parameter at the same position
/// in the descriptor's parameter list.
pub struct ResolvedArgs {
    values: Vec<AnyArc>,
}

impl ResolvedArgs {
    pub(crate) fn new(values: Vec<AnyArc>) -> Self {
        Self { values }
    }

    /// Number of resolved arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the constructor takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gets the concrete-typed argument at `index`.
    pub fn arg<T: 'static + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self
            .values
            .get(index)
            .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
        crate::traits::resolve::downcast::<T>(value.clone())
    }

    /// Gets the trait-object argument at `index`.
    pub fn trait_arg<T: ?Sized + 'static + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self
            .values
            .get(index)
            .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
        crate::traits::resolve::downcast_trait::<T>(value.clone())
    }
}

type ConstructFn = Arc<dyn Fn(&ResolvedArgs) -> Result<AnyArc, BoxError> + Send + Sync>;

/// Describes the single eligible constructor of a type.
///
/// A descriptor pairs the parameter service keys with a construction callback
/// receiving the resolved arguments in the same order.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{ConstructorDescriptor, key_of};
/// use std::sync::Arc;
///
/// struct Engine {
///     cylinders: Arc<u8>,
/// }
///
/// let descriptor = ConstructorDescriptor::new(vec![key_of::<u8>()], |args| {
///     Ok(Engine {
///         cylinders: args.arg::<u8>(0)?,
///     })
/// });
/// assert_eq!(descriptor.parameters().len(), 1);
/// ```
#[derive(Clone)]
pub struct ConstructorDescriptor {
    parameters: Vec<ServiceKey>,
    construct: ConstructFn,
}

impl ConstructorDescriptor {
    /// Creates a descriptor from parameter keys and a construction callback.
    pub fn new<T, F>(parameters: Vec<ServiceKey>, construct: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolvedArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            construct: Arc::new(move |args| construct(args).map(|v| Arc::new(v) as AnyArc)),
        }
    }

    /// The service keys of the constructor's parameters, in order.
    pub fn parameters(&self) -> &[ServiceKey] {
        &self.parameters
    }

    pub(crate) fn construct(&self, args: &ResolvedArgs) -> Result<AnyArc, BoxError> {
        (self.construct)(args)
    }
}

type ApplyFn = Arc<dyn Fn(&AnyArc, AnyArc) -> Result<(), BoxError> + Send + Sync>;

/// Describes an injectable property set after construction.
///
/// The dependency is resolved through the container and handed to the apply
/// callback together with the freshly constructed (type-erased) instance.
/// Property targets use interior mutability; the instance is already shared.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: &'static str,
    dependency: ServiceKey,
    apply: ApplyFn,
}

impl PropertyDescriptor {
    /// Creates a property descriptor for a concrete-typed target.
    pub fn new<T, D, F>(name: &'static str, dependency: ServiceKey, apply: F) -> Self
    where
        T: 'static + Send + Sync,
        D: 'static + Send + Sync,
        F: Fn(&T, Arc<D>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name,
            dependency,
            apply: Arc::new(move |instance, dep| {
                let instance = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| BoxError::from(DiError::TypeMismatch(std::any::type_name::<T>())))?;
                let dep = crate::traits::resolve::downcast::<D>(dep)?;
                apply(instance, dep)
            }),
        }
    }

    /// The property's name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The service key of the property's dependency.
    pub fn dependency(&self) -> &ServiceKey {
        &self.dependency
    }

    pub(crate) fn apply(&self, instance: &AnyArc, dependency: AnyArc) -> Result<(), BoxError> {
        (self.apply)(instance, dependency)
    }
}

/// Pluggable type inspection capability.
///
/// Given a service key, yields the constructible constructors and injectable
/// property metadata of the type. Consumed (never implemented) by the
/// resolution engine: the container builds construction plans from the
/// descriptors and enforces the exactly-one-eligible-constructor contract
/// itself, reporting `AmbiguousConstructor` for zero or multiple candidates.
pub trait TypeInspector: Send + Sync {
    /// All eligible constructors known for the given service type.
    fn constructors(&self, service: &ServiceKey) -> Vec<ConstructorDescriptor>;

    /// Injectable properties of the given service type, in declaration order.
    fn injectable_properties(&self, service: &ServiceKey) -> Vec<PropertyDescriptor>;
}

/// Default registry-backed inspector.
///
/// Types become constructible by being described to the inspector before the
/// container locks. Describing a type twice makes it ambiguous, which
/// surfaces as `AmbiguousConstructor` at first resolution.
///
/// # Examples
///
/// ```rust
/// use crucible_di::{Container, ConstructorDescriptor, Resolve};
///
/// struct Widget;
///
/// let container = Container::new();
/// container
///     .inspector()
///     .describe::<Widget>(ConstructorDescriptor::new(vec![], |_| Ok(Widget)));
///
/// // Widget is unregistered but constructible, so it auto-wires.
/// let widget = container.resolve::<Widget>();
/// assert!(widget.is_ok());
/// ```
#[derive(Default)]
pub struct DescriptorInspector {
    constructors: RwLock<HashMap<TypeId, Vec<ConstructorDescriptor>>>,
    properties: RwLock<HashMap<TypeId, Vec<PropertyDescriptor>>>,
}

impl DescriptorInspector {
    /// Creates an empty inspector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes a constructor for `T`.
    pub fn describe<T: 'static>(&self, descriptor: ConstructorDescriptor) -> &Self {
        self.constructors
            .write()
            .unwrap()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(descriptor);
        self
    }

    /// Describes an injectable property of `T`.
    pub fn describe_property<T: 'static>(&self, property: PropertyDescriptor) -> &Self {
        self.properties
            .write()
            .unwrap()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(property);
        self
    }
}

impl TypeInspector for DescriptorInspector {
    fn constructors(&self, service: &ServiceKey) -> Vec<ConstructorDescriptor> {
        match service {
            ServiceKey::Type(id, _) | ServiceKey::TypeKeyed(id, _, _) => self
                .constructors
                .read()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or_default(),
            // Trait objects have no constructor of their own.
            _ => Vec::new(),
        }
    }

    fn injectable_properties(&self, service: &ServiceKey) -> Vec<PropertyDescriptor> {
        match service {
            ServiceKey::Type(id, _) | ServiceKey::TypeKeyed(id, _, _) => self
                .properties
                .read()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
