use std::sync::Arc;

use async_trait::async_trait;

use datagen_core::{GeneratorOptions, Range};

use crate::errors::GeneratorError;
use crate::generators::{CacheGenerator, Trail, ValueSource};

pub const INT_RANGE: &str = "int_range";

/// Draws zero-padded integers from a parsed [`Range`].
#[derive(Debug, Clone)]
pub struct RangeSource {
    range: Range,
}

pub type RangeGenerator = CacheGenerator<RangeSource>;

impl RangeGenerator {
    pub fn new(options: Arc<GeneratorOptions>, range: Range) -> Self {
        Self::wrap(INT_RANGE, options, RangeSource { range })
    }

    pub fn range(&self) -> &Range {
        &self.source().range
    }
}

#[async_trait]
impl ValueSource for RangeSource {
    async fn produce(&self, _trail: &mut Trail) -> Result<String, GeneratorError> {
        Ok(self.range.sample_padded(&mut rand::rng()))
    }
}
