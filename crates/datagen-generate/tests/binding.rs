use std::sync::Arc;

use datagen_core::{GeneratorOptions, ValueStore};
use datagen_generate::{
    Generator, GeneratorError, Registry, ResourceBinding, bind_resource, bind_resources,
    register_builtin_types,
};
use datagen_store::MemoryStore;

fn names_store() -> Arc<dyn ValueStore> {
    let store = MemoryStore::new();
    for name in ["Ana", "Bruno", "Carla"] {
        store.insert_row("person_prop", &[("type", "first_name"), ("value", name)]);
    }
    store.insert_row("person_prop", &[("type", "last_name"), ("value", "Silva")]);
    Arc::new(store)
}

fn registry(store: Option<Arc<dyn ValueStore>>) -> Registry {
    let mut registry = Registry::new();
    register_builtin_types(&mut registry, store).expect("register builtin types");
    registry
}

fn defaults() -> Arc<GeneratorOptions> {
    Arc::new(GeneratorOptions::default())
}

#[test]
fn builtin_types_are_listed() {
    let registry = registry(Some(names_store()));
    assert_eq!(
        registry.type_names(),
        vec!["int_range", "pattern", "random_row", "union"]
    );

    let without_store = self::registry(None);
    assert!(!without_store.contains_type("random_row"));
}

#[test]
fn duplicate_type_is_a_conflict() {
    let mut registry = registry(None);
    let err = register_builtin_types(&mut registry, None).expect_err("second registration");
    assert!(matches!(
        err,
        GeneratorError::RegistrationConflict { kind: "generator type", .. }
    ));
}

#[tokio::test]
async fn bound_generator_is_named_after_its_resource() {
    let registry = registry(None);
    let resource = bind_resource(
        &registry,
        &defaults(),
        &ResourceBinding::new("Digit", "int_range", "0..10"),
    )
    .await
    .expect("bind resource");

    assert_eq!(resource.generator.name(), "Digit");
    assert_eq!(resource.generator.kind(), "int_range");
    let instance = registry.get_instance("digit").expect("case-insensitive lookup");
    assert_eq!(instance.name(), "Digit");
}

#[tokio::test]
async fn pattern_arguments_keep_their_colons() {
    let registry = registry(None);
    let resource = bind_resource(
        &registry,
        &defaults(),
        &ResourceBinding::new("clock", "pattern", "10..13:30..60"),
    )
    .await
    .expect("bind pattern");

    let value = resource.generator.next().await.expect("draw");
    let (hours, minutes) = value.split_once(':').expect("colon kept");
    assert!((10..13).contains(&hours.parse::<i64>().expect("hours")));
    assert!((30..60).contains(&minutes.parse::<i64>().expect("minutes")));
}

#[tokio::test]
async fn random_row_draws_filtered_values() {
    let registry = registry(Some(names_store()));
    let resource = bind_resource(
        &registry,
        &defaults(),
        &ResourceBinding::new("first_name", "random_row", "person_prop:type=first_name"),
    )
    .await
    .expect("bind random_row");

    for _ in 0..50 {
        let value = resource.generator.next().await.expect("draw");
        assert!(["Ana", "Bruno", "Carla"].contains(&value.as_str()));
    }
}

#[tokio::test]
async fn empty_filter_is_detected_while_binding() {
    let registry = registry(Some(names_store()));
    let err = bind_resource(
        &registry,
        &defaults(),
        &ResourceBinding::new("nick", "random_row", "person_prop:type=nickname"),
    )
    .await
    .expect_err("no rows");

    assert!(matches!(err, GeneratorError::EmptyResult { .. }));
    assert!(!registry.instances().contains("nick"));
}

#[tokio::test]
async fn per_resource_options_override_defaults() {
    let registry = registry(None);
    let binding = ResourceBinding::new("coin", "int_range", "0|1")
        .with_options(GeneratorOptions::unique(30));
    let resource = bind_resource(&registry, &defaults(), &binding)
        .await
        .expect("bind resource");

    assert!(resource.generator.options().enforce_uniqueness);
    resource.generator.next().await.expect("first");
    resource.generator.next().await.expect("second");
    assert!(matches!(
        resource.generator.next().await,
        Err(GeneratorError::RetriesExhausted { .. })
    ));
}

#[tokio::test]
async fn invalid_bindings_are_skipped() {
    let registry = registry(None);
    let bindings = vec![
        ResourceBinding::new("digit", "int_range", "0..10"),
        ResourceBinding::new("broken", "int_range", "9..1"),
        ResourceBinding::new("mystery", "uuid", ""),
        ResourceBinding::new("rows", "random_row", "person_prop:type=first_name"),
        ResourceBinding::new("code", "pattern", "C-000..999"),
    ];

    let bound = bind_resources(&registry, &defaults(), &bindings)
        .await
        .expect("bind resources");

    let active: Vec<&str> = bound.active.iter().map(|resource| resource.name()).collect();
    assert_eq!(active, vec!["digit", "code"]);

    let skipped: Vec<&str> = bound
        .skipped
        .iter()
        .map(|skipped| skipped.binding.name.as_str())
        .collect();
    assert_eq!(skipped, vec!["broken", "mystery", "rows"]);
    assert!(matches!(bound.skipped[0].error, GeneratorError::Parse(_)));
    assert!(matches!(bound.skipped[1].error, GeneratorError::UnknownType(_)));
    assert!(matches!(bound.skipped[2].error, GeneratorError::UnknownType(_)));
}

#[tokio::test]
async fn duplicate_resource_aborts_binding() {
    let registry = registry(None);
    let bindings = vec![
        ResourceBinding::new("digit", "int_range", "0..10"),
        ResourceBinding::new("DIGIT", "int_range", "0..5"),
    ];

    let err = bind_resources(&registry, &defaults(), &bindings)
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, GeneratorError::RegistrationConflict { .. }));
}

#[tokio::test]
async fn selection_is_case_insensitive_and_ordered() {
    let registry = registry(None);
    let bindings = vec![
        ResourceBinding::new("Alpha", "int_range", "0..10"),
        ResourceBinding::new("beta", "int_range", "1|2"),
    ];
    let bound = bind_resources(&registry, &defaults(), &bindings)
        .await
        .expect("bind resources");

    let selected = bound.select(&["BETA", "alpha"]).expect("select");
    let names: Vec<&str> = selected.iter().map(|resource| resource.name()).collect();
    assert_eq!(names, vec!["beta", "Alpha"]);
    assert!(bound.select(&["gamma"]).is_err());
}
