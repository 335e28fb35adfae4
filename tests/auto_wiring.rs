//! Auto-wiring through the descriptor inspector and plan compiler.

use crucible_di::{
    Container, ConstructorDescriptor, DiError, Lifestyle, PropertyDescriptor, Resolve, ServiceKey,
    key_of, key_of_trait,
};
use std::sync::{Arc, Mutex};

trait Weapon: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Katana;
impl Weapon for Katana {
    fn name(&self) -> &'static str {
        "katana"
    }
}

struct Samurai {
    weapon: Arc<dyn Weapon>,
}

fn describe_samurai(container: &Container) {
    container.inspector().describe::<Samurai>(ConstructorDescriptor::new(
        vec![key_of_trait::<dyn Weapon>()],
        |args| {
            Ok(Samurai {
                weapon: args.trait_arg::<dyn Weapon>(0)?,
            })
        },
    ));
}

#[test]
fn registered_type_auto_wires_through_the_inspector() {
    let container = Container::new();
    container
        .register_trait_factory::<dyn Weapon, _>(Lifestyle::Singleton, |_| Arc::new(Katana))
        .unwrap();
    describe_samurai(&container);
    container.register::<Samurai>(Lifestyle::Singleton).unwrap();

    let samurai = container.resolve::<Samurai>().unwrap();
    assert_eq!(samurai.weapon.name(), "katana");

    let again = container.resolve::<Samurai>().unwrap();
    assert!(Arc::ptr_eq(&samurai, &again));
}

#[test]
fn unregistered_constructible_type_auto_wires_as_transient() {
    let container = Container::new();
    container
        .register_trait_factory::<dyn Weapon, _>(Lifestyle::Singleton, |_| Arc::new(Katana))
        .unwrap();
    describe_samurai(&container);

    let first = container.resolve::<Samurai>().unwrap();
    let second = container.resolve::<Samurai>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    // Transient consumers still share the singleton dependency.
    assert!(Arc::ptr_eq(&first.weapon, &second.weapon));
}

#[test]
fn missing_parameter_reports_the_consumer() {
    let container = Container::new();
    describe_samurai(&container);

    match container.resolve::<Samurai>().err() {
        Some(DiError::UnresolvableParameter { consumer, parameter }) => {
            assert!(consumer.contains("Samurai"));
            assert!(parameter.contains("Weapon"));
        }
        other => panic!("expected UnresolvableParameter, got {:?}", other),
    }
}

#[test]
fn undescribed_type_cannot_be_resolved() {
    let container = Container::new();
    assert!(matches!(
        container.resolve::<Samurai>(),
        Err(DiError::NoRegistration(_))
    ));
}

#[test]
fn two_described_constructors_are_ambiguous() {
    let container = Container::new();
    container
        .register_trait_factory::<dyn Weapon, _>(Lifestyle::Singleton, |_| Arc::new(Katana))
        .unwrap();
    describe_samurai(&container);
    describe_samurai(&container);

    match container.resolve::<Samurai>().err() {
        Some(DiError::AmbiguousConstructor { found, .. }) => assert_eq!(found, 2),
        other => panic!("expected AmbiguousConstructor, got {:?}", other),
    }
}

#[test]
fn registered_auto_wired_type_with_no_descriptor_is_ambiguous() {
    let container = Container::new();
    container.register::<Samurai>(Lifestyle::Transient).unwrap();

    match container.resolve::<Samurai>().err() {
        Some(DiError::AmbiguousConstructor { found, .. }) => assert_eq!(found, 0),
        other => panic!("expected AmbiguousConstructor, got {:?}", other),
    }
}

struct Dojo {
    // Interior mutability: properties are injected after construction.
    master: Mutex<Option<Arc<Samurai>>>,
}

#[test]
fn properties_are_injected_after_construction() {
    let container = Container::new();
    container
        .register_trait_factory::<dyn Weapon, _>(Lifestyle::Singleton, |_| Arc::new(Katana))
        .unwrap();
    describe_samurai(&container);
    container
        .inspector()
        .describe::<Dojo>(ConstructorDescriptor::new(vec![], |_| {
            Ok(Dojo {
                master: Mutex::new(None),
            })
        }));
    container
        .inspector()
        .describe_property::<Dojo>(PropertyDescriptor::new(
            "master",
            key_of::<Samurai>(),
            |dojo: &Dojo, samurai: Arc<Samurai>| {
                *dojo.master.lock().unwrap() = Some(samurai);
                Ok(())
            },
        ));

    let dojo = container.resolve::<Dojo>().unwrap();
    let master = dojo.master.lock().unwrap();
    assert_eq!(master.as_ref().unwrap().weapon.name(), "katana");
}

#[test]
fn constructor_error_surfaces_as_factory_threw() {
    struct Broken;
    let container = Container::new();
    container
        .inspector()
        .describe::<Broken>(ConstructorDescriptor::new(vec![], |_| {
            Err::<Broken, _>("missing calibration data".into())
        }));
    container.register::<Broken>(Lifestyle::Transient).unwrap();

    match container.resolve::<Broken>().err() {
        Some(DiError::FactoryThrew { message, .. }) => {
            assert!(message.contains("missing calibration data"));
        }
        other => panic!("expected FactoryThrew, got {:?}", other),
    }
}

#[test]
fn concrete_parameters_resolve_by_key() {
    struct Blade;
    struct Sheath {
        blade: Arc<Blade>,
    }

    let container = Container::new();
    container.register_instance(Blade).unwrap();
    container
        .inspector()
        .describe::<Sheath>(ConstructorDescriptor::new(
            vec![ServiceKey::of::<Blade>()],
            |args| {
                Ok(Sheath {
                    blade: args.arg::<Blade>(0)?,
                })
            },
        ));

    let sheath = container.resolve::<Sheath>().unwrap();
    let blade = container.resolve::<Blade>().unwrap();
    assert!(Arc::ptr_eq(&sheath.blade, &blade));
}
