use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use datagen_core::GeneratorOptions;

use crate::errors::GeneratorError;
use crate::generators::{CacheGenerator, Trail, ValueSource};
use crate::registry::Resolve;

pub const UNION: &str = "union";

/// Delegates each draw to a randomly picked sibling resource.
///
/// Siblings are resolved by name on every draw, so the union follows the
/// registry as it is when drawing, not when constructed.
pub struct UnionSource {
    variants: Vec<String>,
    resolver: Arc<dyn Resolve>,
}

pub type UnionGenerator = CacheGenerator<UnionSource>;

impl UnionSource {
    pub fn new(variants: Vec<String>, resolver: Arc<dyn Resolve>) -> Result<Self, GeneratorError> {
        if variants.is_empty() {
            return Err(GeneratorError::invalid_arguments(
                UNION,
                "expected at least one resource name",
            ));
        }
        Ok(Self { variants, resolver })
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

impl UnionGenerator {
    pub fn new(
        options: Arc<GeneratorOptions>,
        variants: Vec<String>,
        resolver: Arc<dyn Resolve>,
    ) -> Result<Self, GeneratorError> {
        Ok(Self::wrap(UNION, options, UnionSource::new(variants, resolver)?))
    }
}

#[async_trait]
impl ValueSource for UnionSource {
    async fn produce(&self, trail: &mut Trail) -> Result<String, GeneratorError> {
        let index = rand::rng().random_range(0..self.variants.len());
        let name = &self.variants[index];
        let generator = self
            .resolver
            .resolve(name)
            .ok_or_else(|| GeneratorError::UnknownResource(name.clone()))?;
        generator.next_traced(trail).await
    }
}
