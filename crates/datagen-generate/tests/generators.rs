use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use datagen_core::{GeneratorOptions, parse_range};
use datagen_generate::generators::{CacheGenerator, PatternGenerator, RangeGenerator};
use datagen_generate::{Generator, GeneratorError, Trail, ValueSource};

fn options() -> Arc<GeneratorOptions> {
    Arc::new(GeneratorOptions::default())
}

#[tokio::test]
async fn bounded_samples_stay_in_range() {
    let generator = RangeGenerator::new(options(), parse_range("5..17").expect("parse range"));
    for _ in 0..1_000 {
        let value: i64 = generator
            .next()
            .await
            .expect("draw")
            .parse()
            .expect("numeric value");
        assert!((5..17).contains(&value), "{value} out of range");
    }
}

#[tokio::test]
async fn exclusions_are_never_drawn() {
    let generator = RangeGenerator::new(options(), parse_range("0..6!2|4").expect("parse range"));
    for _ in 0..1_000 {
        let value = generator.next().await.expect("draw");
        assert_ne!(value, "2");
        assert_ne!(value, "4");
    }
}

#[tokio::test]
async fn discrete_samples_are_declared_values() {
    let generator = RangeGenerator::new(options(), parse_range("1|2|3").expect("parse range"));
    assert_eq!(generator.range().bounds(), (1, 3));
    for _ in 0..200 {
        let value = generator.next().await.expect("draw");
        assert!(["1", "2", "3"].contains(&value.as_str()), "unexpected {value}");
    }
}

#[tokio::test]
async fn padding_follows_the_min_token() {
    let generator = RangeGenerator::new(options(), parse_range("007..009").expect("parse range"));
    for _ in 0..100 {
        let value = generator.next().await.expect("draw");
        assert!(value == "007" || value == "008", "unexpected {value}");
    }
}

#[tokio::test]
async fn pattern_segments_are_resampled_independently() {
    let generator = PatternGenerator::new(options(), "A{0..3}-B{1|2}").expect("compile pattern");
    assert_eq!(generator.source().compiled(), "A{{group_1}}-B{{group_2}}");
    assert_eq!(generator.source().groups().len(), 2);

    let mut seen = HashSet::new();
    for _ in 0..500 {
        seen.insert(generator.next().await.expect("draw"));
    }
    let mut expected = HashSet::new();
    for a in 0..3 {
        for b in 1..=2 {
            expected.insert(format!("A{{{a}}}-B{{{b}}}"));
        }
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn pattern_without_ranges_is_constant() {
    let generator = PatternGenerator::new(options(), "static-text").expect("compile pattern");
    assert_eq!(generator.next().await.expect("draw"), "static-text");
}

#[test]
fn pattern_rejects_malformed_ranges() {
    let err = PatternGenerator::new(options(), "X-5..5")
        .err()
        .expect("empty range must fail");
    assert!(matches!(err, GeneratorError::Parse(_)));
}

/// Replays a fixed sequence of values, counting draws.
struct Sequence {
    values: Vec<&'static str>,
    draws: AtomicUsize,
}

impl Sequence {
    fn new(values: Vec<&'static str>) -> Self {
        Self {
            values,
            draws: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ValueSource for Sequence {
    async fn produce(&self, _trail: &mut Trail) -> Result<String, GeneratorError> {
        let index = self.draws.fetch_add(1, Ordering::SeqCst);
        Ok(self.values[index % self.values.len()].to_string())
    }
}

#[tokio::test]
async fn uniqueness_redraws_until_a_new_value() {
    let generator = CacheGenerator::wrap(
        "sequence",
        Arc::new(GeneratorOptions::unique(3)),
        Sequence::new(vec!["a", "a", "b"]),
    );

    assert_eq!(generator.next().await.expect("first"), "a");
    assert_eq!(generator.next().await.expect("second"), "b");
    assert_eq!(generator.source().draws.load(Ordering::SeqCst), 3);
    assert_eq!(generator.seen_count(), 2);
}

#[tokio::test]
async fn uniqueness_budget_is_bounded() {
    let generator = CacheGenerator::wrap(
        "sequence",
        Arc::new(GeneratorOptions::unique(3)),
        Sequence::new(vec!["x", "y"]),
    );

    generator.next().await.expect("first distinct value");
    generator.next().await.expect("second distinct value");
    let err = generator.next().await.expect_err("source is exhausted");

    assert!(matches!(
        err,
        GeneratorError::RetriesExhausted { retries: 3, .. }
    ));
    // One draw for each accepted value plus the three failed attempts.
    assert_eq!(generator.source().draws.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn duplicates_pass_through_without_uniqueness() {
    let generator = CacheGenerator::wrap("sequence", options(), Sequence::new(vec!["same"]));
    for _ in 0..5 {
        assert_eq!(generator.next().await.expect("draw"), "same");
    }
    assert_eq!(generator.seen_count(), 0);
}

#[tokio::test]
async fn unique_two_value_range_yields_both_then_fails() {
    let generator = RangeGenerator::new(
        Arc::new(GeneratorOptions::unique(50)),
        parse_range("1|2").expect("parse range"),
    );

    let mut values = vec![
        generator.next().await.expect("first"),
        generator.next().await.expect("second"),
    ];
    values.sort();
    assert_eq!(values, vec!["1", "2"]);
    assert!(matches!(
        generator.next().await,
        Err(GeneratorError::RetriesExhausted { .. })
    ));
}

#[test]
fn trail_rejects_reentry() {
    let mut trail = Trail::default();
    trail.enter("a").expect("enter a");
    trail.enter("b").expect("enter b");
    let err = trail.enter("A").expect_err("cycle");
    assert!(matches!(err, GeneratorError::Cycle(path) if path == "a -> b -> a"));
    trail.leave();
    assert_eq!(trail.depth(), 1);
}
