//! Generator capability and its built-in variants.
//!
//! Every variant is a [`ValueSource`] wrapped by [`CacheGenerator`], which
//! names the generator, carries its options and enforces uniqueness when
//! asked to.

mod cache;
mod pattern;
mod random_row;
mod range;
mod union;

use async_trait::async_trait;

use datagen_core::GeneratorOptions;

use crate::errors::GeneratorError;

pub use cache::CacheGenerator;
pub use pattern::{PATTERN, PatternGenerator, PatternSource};
pub use random_row::{RANDOM_ROW, RandomRowGenerator, RandomRowSource};
pub use range::{INT_RANGE, RangeGenerator, RangeSource};
pub use union::{UNION, UnionGenerator, UnionSource};

/// Stateful value producer bound to a resource.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Instance name, the resource name once bound.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Generator type name (`int_range`, `pattern`, ...).
    fn kind(&self) -> &'static str;

    fn options(&self) -> &GeneratorOptions;

    /// Load whatever the generator needs before the first draw.
    async fn prepare(&self) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// Draw the next value, recording the resolution path in `trail`.
    async fn next_traced(&self, trail: &mut Trail) -> Result<String, GeneratorError>;

    async fn next(&self) -> Result<String, GeneratorError> {
        self.next_traced(&mut Trail::default()).await
    }
}

/// Raw strategy behind a generator.
#[async_trait]
pub trait ValueSource: Send + Sync {
    async fn prepare(&self) -> Result<(), GeneratorError> {
        Ok(())
    }

    async fn produce(&self, trail: &mut Trail) -> Result<String, GeneratorError>;
}

/// Names of the generators currently being drawn from, outermost first.
///
/// A union resolving into a generator already on the trail would recurse
/// forever, so entering a name twice fails with [`GeneratorError::Cycle`].
#[derive(Debug, Clone, Default)]
pub struct Trail {
    names: Vec<String>,
}

impl Trail {
    pub fn enter(&mut self, name: &str) -> Result<(), GeneratorError> {
        let key = name.to_lowercase();
        if self.names.contains(&key) {
            let mut path = self.names.clone();
            path.push(key);
            return Err(GeneratorError::Cycle(path.join(" -> ")));
        }
        self.names.push(key);
        Ok(())
    }

    pub fn leave(&mut self) {
        self.names.pop();
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }
}
