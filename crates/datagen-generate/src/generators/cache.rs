use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use datagen_core::GeneratorOptions;

use crate::errors::GeneratorError;
use crate::generators::{Generator, Trail, ValueSource};

/// Decorator turning a [`ValueSource`] into a named [`Generator`].
///
/// With `enforce_uniqueness` set, a value already emitted by this instance
/// is drawn again, up to `max_unique_retries` draws in total, after which
/// [`GeneratorError::RetriesExhausted`] is returned. Accepted values are
/// remembered for the lifetime of the instance.
pub struct CacheGenerator<S> {
    name: String,
    kind: &'static str,
    options: Arc<GeneratorOptions>,
    source: S,
    seen: Mutex<HashSet<String>>,
}

impl<S: ValueSource> CacheGenerator<S> {
    pub fn wrap(kind: &'static str, options: Arc<GeneratorOptions>, source: S) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            options,
            source,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of distinct values remembered so far.
    pub fn seen_count(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn accept(&self, value: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.contains(value) {
            return false;
        }
        seen.insert(value.to_string())
    }

    async fn draw(&self, trail: &mut Trail) -> Result<String, GeneratorError> {
        let mut value = self.source.produce(trail).await?;
        if !self.options.enforce_uniqueness {
            return Ok(value);
        }

        let mut attempts = 1;
        while !self.accept(&value) {
            if attempts >= self.options.max_unique_retries {
                return Err(GeneratorError::RetriesExhausted {
                    generator: self.name.clone(),
                    retries: self.options.max_unique_retries,
                });
            }
            attempts += 1;
            value = self.source.produce(trail).await?;
        }
        Ok(value)
    }
}

#[async_trait]
impl<S: ValueSource> Generator for CacheGenerator<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    async fn prepare(&self) -> Result<(), GeneratorError> {
        self.source.prepare().await
    }

    async fn next_traced(&self, trail: &mut Trail) -> Result<String, GeneratorError> {
        trail.enter(&self.name)?;
        let drawn = self.draw(trail).await;
        trail.leave();
        drawn
    }
}
