use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use datagen_core::{GeneratorOptions, StoreError, ValueStore};
use datagen_generate::generators::RandomRowGenerator;
use datagen_generate::{Generator, GeneratorError};

/// Serves fixed rows and counts how often it is queried.
struct CountingStore {
    rows: Vec<String>,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new(rows: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            rows: rows.iter().map(|row| row.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueStore for CountingStore {
    fn engine(&self) -> &'static str {
        "counting"
    }

    async fn select_values(
        &self,
        _table: &str,
        _column: &str,
        _value: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }
}

fn generator(store: Arc<CountingStore>) -> RandomRowGenerator {
    RandomRowGenerator::new(
        Arc::new(GeneratorOptions::default()),
        store,
        "person_prop",
        "type",
        "first_name",
    )
    .expect("random_row generator")
}

#[tokio::test]
async fn rows_are_loaded_once_on_first_draw() {
    let store = CountingStore::new(&["Ana", "Bruno", "Carla"]);
    let generator = generator(store.clone());

    assert_eq!(store.calls(), 0);
    assert_eq!(generator.source().cached_rows(), None);

    for _ in 0..20 {
        let value = generator.next().await.expect("draw row");
        assert!(["Ana", "Bruno", "Carla"].contains(&value.as_str()));
    }

    assert_eq!(store.calls(), 1);
    assert_eq!(generator.source().cached_rows(), Some(3));
}

#[tokio::test]
async fn draws_repeat_rows_when_more_are_requested() {
    let store = CountingStore::new(&["only"]);
    let generator = generator(store.clone());

    for _ in 0..5 {
        assert_eq!(generator.next().await.expect("draw row"), "only");
    }
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn empty_filter_fails_on_first_draw() {
    let store = CountingStore::new(&[]);
    let generator = generator(store.clone());
    assert_eq!(store.calls(), 0);

    let err = generator.next().await.expect_err("empty filter");
    assert!(matches!(
        err,
        GeneratorError::EmptyResult { ref table, ref column, ref value }
            if table == "person_prop" && column == "type" && value == "first_name"
    ));
    assert_eq!(generator.source().cached_rows(), None);
}

#[test]
fn unsafe_table_name_is_rejected() {
    let store = CountingStore::new(&["Ana"]);
    let result = RandomRowGenerator::new(
        Arc::new(GeneratorOptions::default()),
        store,
        "person; drop table locale",
        "type",
        "first_name",
    );
    assert!(matches!(result, Err(GeneratorError::Store(_))));
}
