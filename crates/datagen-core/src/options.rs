use serde::{Deserialize, Serialize};

/// Default retry budget used when uniqueness is enforced.
pub const DEFAULT_MAX_UNIQUE_RETRIES: u32 = 20;

/// Options shared by a generator for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Reject values already emitted by the same generator.
    pub enforce_uniqueness: bool,
    /// Maximum draws attempted for one value when uniqueness is enforced.
    pub max_unique_retries: u32,
}

impl GeneratorOptions {
    pub fn unique(max_unique_retries: u32) -> Self {
        Self {
            enforce_uniqueness: true,
            max_unique_retries,
        }
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            enforce_uniqueness: false,
            max_unique_retries: DEFAULT_MAX_UNIQUE_RETRIES,
        }
    }
}
