//! Ordered collection registration and resolution.

use crucible_di::{Container, DiError, Lifestyle, Resolve};
use std::sync::Arc;

trait Handler: Send + Sync {
    fn id(&self) -> u32;
}

struct H(u32);
impl Handler for H {
    fn id(&self) -> u32 {
        self.0
    }
}

#[test]
fn collection_preserves_registration_order() {
    let container = Container::new();
    container
        .register_collection::<u32>(vec![Arc::new(3), Arc::new(1), Arc::new(2)])
        .unwrap();

    let values: Vec<u32> = container
        .resolve_all::<u32>()
        .unwrap()
        .iter()
        .map(|v| **v)
        .collect();
    assert_eq!(values, vec![3, 1, 2]);
}

#[test]
fn missing_collection_resolves_empty() {
    let container = Container::new();
    assert!(container.resolve_all::<u32>().unwrap().is_empty());
    assert!(container.resolve_all_trait::<dyn Handler>().unwrap().is_empty());
}

#[test]
fn trait_collections_preserve_order() {
    let container = Container::new();
    container
        .register_trait_collection::<dyn Handler>(vec![
            Arc::new(H(10)),
            Arc::new(H(20)),
            Arc::new(H(30)),
        ])
        .unwrap();

    let ids: Vec<u32> = container
        .resolve_all_trait::<dyn Handler>()
        .unwrap()
        .iter()
        .map(|h| h.id())
        .collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[test]
fn factory_items_resolve_through_the_context() {
    struct Prefix(&'static str);
    let container = Container::new();
    container.register_instance(Prefix("h")).unwrap();
    container
        .register_collection_factories::<String, _>(vec![
            |ctx: &crucible_di::ResolutionContext<'_>| {
                let prefix = ctx.resolve::<Prefix>()?;
                Ok(Some(format!("{}1", prefix.0)))
            },
        ])
        .unwrap();

    let values = container.resolve_all::<String>().unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(*values[0], "h1");
}

type ByteItem =
    fn(&crucible_di::ResolutionContext<'_>) -> Result<Option<u8>, crucible_di::BoxError>;

#[test]
fn null_item_fails_the_whole_collection() {
    let container = Container::new();
    let items: Vec<ByteItem> = vec![|_| Ok(Some(1)), |_| Ok(None), |_| Ok(Some(3))];
    container.register_collection_factories::<u8, _>(items).unwrap();

    assert!(matches!(
        container.resolve_all::<u8>(),
        Err(DiError::NullProduced(_))
    ));
}

#[test]
fn failing_item_surfaces_as_factory_threw() {
    let container = Container::new();
    let items: Vec<ByteItem> = vec![|_| Ok(Some(1)), |_| Err("broken item".into())];
    container.register_collection_factories::<u8, _>(items).unwrap();

    match container.resolve_all::<u8>() {
        Err(DiError::FactoryThrew { message, .. }) => assert!(message.contains("broken item")),
        other => panic!("expected FactoryThrew, got {:?}", other),
    }
}

#[test]
fn collection_items_are_shared_arcs() {
    let shared = Arc::new(7u32);
    let container = Container::new();
    container
        .register_collection::<u32>(vec![shared.clone()])
        .unwrap();

    let resolved = container.resolve_all::<u32>().unwrap();
    assert!(Arc::ptr_eq(&resolved[0], &shared));
}

#[test]
fn collections_and_scoped_items_interact() {
    let container = Container::new();
    container
        .register_factory(Lifestyle::Scoped, |_| 5u64)
        .unwrap();
    container
        .register_collection_factories::<u64, _>(vec![
            |ctx: &crucible_di::ResolutionContext<'_>| Ok(Some(*ctx.resolve::<u64>()? * 2)),
        ])
        .unwrap();

    let scope = container.create_scope();
    let values = scope.resolve_all::<u64>().unwrap();
    assert_eq!(*values[0], 10);
    scope.dispose();
}
