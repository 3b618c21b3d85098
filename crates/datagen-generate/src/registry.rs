use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use datagen_core::GeneratorOptions;

use crate::errors::GeneratorError;
use crate::generators::Generator;

/// Factory building a generator from its options and argument list.
pub type Allocator = Arc<
    dyn Fn(Arc<GeneratorOptions>, &[&str]) -> Result<Box<dyn Generator>, GeneratorError>
        + Send
        + Sync,
>;

/// Wrap a closure into an [`Allocator`].
pub fn allocator<F>(allocate: F) -> Allocator
where
    F: Fn(Arc<GeneratorOptions>, &[&str]) -> Result<Box<dyn Generator>, GeneratorError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(allocate)
}

/// Name-based lookup of live generators.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Generator>>;
}

/// Live generators keyed by resource name (case-insensitive).
///
/// Cloning shares the same map, which is how union generators observe
/// resources registered after their own construction.
#[derive(Clone, Default)]
pub struct Instances {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Generator>>>>,
}

impl Instances {
    pub fn add(&self, generator: Arc<dyn Generator>) -> Result<(), GeneratorError> {
        let key = generator.name().to_lowercase();
        let mut instances = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if instances.contains_key(&key) {
            return Err(GeneratorError::RegistrationConflict {
                kind: "generator instance",
                name: generator.name().to_string(),
            });
        }
        instances.insert(key, generator);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Generator>, GeneratorError> {
        self.find(name)
            .ok_or_else(|| GeneratorError::UnknownResource(name.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Generator>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_lowercase())
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Resolve for Instances {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Generator>> {
        self.find(name)
    }
}

impl fmt::Debug for Instances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instances = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = instances.keys().collect();
        names.sort();
        f.debug_struct("Instances").field("names", &names).finish()
    }
}

/// Generator types and live instances.
#[derive(Default)]
pub struct Registry {
    types: HashMap<String, Allocator>,
    instances: Instances,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, name: &str, allocator: Allocator) -> Result<(), GeneratorError> {
        if self.contains_type(name) {
            return Err(GeneratorError::RegistrationConflict {
                kind: "generator type",
                name: name.to_string(),
            });
        }
        self.types.insert(name.to_string(), allocator);
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> Result<Allocator, GeneratorError> {
        self.find_type(name)
            .ok_or_else(|| GeneratorError::UnknownType(name.to_string()))
    }

    pub fn find_type(&self, name: &str) -> Option<Allocator> {
        self.types.get(name).cloned()
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn instances(&self) -> &Instances {
        &self.instances
    }

    pub fn add_instance(&self, generator: Arc<dyn Generator>) -> Result<(), GeneratorError> {
        self.instances.add(generator)
    }

    pub fn get_instance(&self, name: &str) -> Result<Arc<dyn Generator>, GeneratorError> {
        self.instances.get(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .field("instances", &self.instances)
            .finish()
    }
}
