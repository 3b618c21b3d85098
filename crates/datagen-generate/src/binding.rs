//! Resource declarations and their binding to generator instances.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use datagen_core::{GeneratorOptions, ValueStore, parse_range};

use crate::errors::{GeneratorError, PipelineError};
use crate::generators::{
    Generator, INT_RANGE, PATTERN, PatternGenerator, RANDOM_ROW, RandomRowGenerator,
    RangeGenerator, UNION, UnionGenerator,
};
use crate::registry::{Registry, Resolve, allocator};

/// Declarative binding of a resource to a generator type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub name: String,
    pub generator: String,
    /// Colon-delimited generator arguments.
    #[serde(default)]
    pub args: String,
    /// Overrides the default generator options for this resource only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GeneratorOptions>,
}

impl ResourceBinding {
    pub fn new(name: &str, generator: &str, args: &str) -> Self {
        Self {
            name: name.to_string(),
            generator: generator.to_string(),
            args: args.to_string(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn split_args(&self) -> Vec<&str> {
        if self.args.is_empty() {
            Vec::new()
        } else {
            self.args.split(':').collect()
        }
    }
}

impl fmt::Display for ResourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}['{}']", self.name, self.generator, self.args)
    }
}

/// Resource bound to a live generator.
#[derive(Clone)]
pub struct Resource {
    pub binding: ResourceBinding,
    pub generator: Arc<dyn Generator>,
}

impl Resource {
    pub fn name(&self) -> &str {
        &self.binding.name
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("binding", &self.binding)
            .field("generator", &self.generator.kind())
            .finish()
    }
}

/// Resource that could not be bound, and why.
#[derive(Debug)]
pub struct SkippedResource {
    pub binding: ResourceBinding,
    pub error: GeneratorError,
}

/// Outcome of binding a set of declarations.
#[derive(Debug, Default)]
pub struct BoundResources {
    pub active: Vec<Resource>,
    pub skipped: Vec<SkippedResource>,
}

impl BoundResources {
    /// Find an active resource by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Resource> {
        self.active
            .iter()
            .find(|resource| resource.name().eq_ignore_ascii_case(name))
    }

    /// Resolve requested names to active resources, in request order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Resource>, PipelineError> {
        names
            .iter()
            .map(|name| {
                self.find(name.as_ref())
                    .cloned()
                    .ok_or_else(|| PipelineError::UnknownResource(name.as_ref().to_string()))
            })
            .collect()
    }
}

/// Register `int_range`, `pattern`, `union` and, given a store, `random_row`.
pub fn register_builtin_types(
    registry: &mut Registry,
    store: Option<Arc<dyn ValueStore>>,
) -> Result<(), GeneratorError> {
    registry.add_type(
        INT_RANGE,
        allocator(|options, args| {
            let [expr] = args else {
                return Err(arity_error(INT_RANGE, "'min..max' or 'v1|v2|...'", args));
            };
            let range = parse_range(expr)?;
            Ok(Box::new(RangeGenerator::new(options, range)))
        }),
    )?;

    registry.add_type(
        PATTERN,
        allocator(|options, args| {
            if args.is_empty() {
                return Err(arity_error(PATTERN, "a template", args));
            }
            let template = args.join(":");
            Ok(Box::new(PatternGenerator::new(options, &template)?))
        }),
    )?;

    let resolver: Arc<dyn Resolve> = Arc::new(registry.instances().clone());
    registry.add_type(
        UNION,
        allocator(move |options, args| {
            let [variants] = args else {
                return Err(arity_error(UNION, "'resource|resource|...'", args));
            };
            let variants: Vec<String> = variants
                .split('|')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            Ok(Box::new(UnionGenerator::new(
                options,
                variants,
                Arc::clone(&resolver),
            )?))
        }),
    )?;

    if let Some(store) = store {
        registry.add_type(
            RANDOM_ROW,
            allocator(move |options, args| {
                let [table, filter] = args else {
                    return Err(arity_error(RANDOM_ROW, "table, column=value", args));
                };
                let Some((column, value)) = filter.split_once('=') else {
                    return Err(GeneratorError::invalid_arguments(
                        RANDOM_ROW,
                        format!("expected 'column=value' filter but got '{filter}'"),
                    ));
                };
                Ok(Box::new(RandomRowGenerator::new(
                    options,
                    Arc::clone(&store),
                    table.trim(),
                    column.trim(),
                    value.trim(),
                )?))
            }),
        )?;
    }

    Ok(())
}

fn arity_error(generator: &str, expected: &str, args: &[&str]) -> GeneratorError {
    GeneratorError::invalid_arguments(
        generator,
        format!("expected {expected} but got {} argument(s): {args:?}", args.len()),
    )
}

/// Allocate, name, prepare and register the generator of one resource.
pub async fn bind_resource(
    registry: &Registry,
    defaults: &Arc<GeneratorOptions>,
    binding: &ResourceBinding,
) -> Result<Resource, GeneratorError> {
    if registry.instances().contains(&binding.name) {
        return Err(GeneratorError::RegistrationConflict {
            kind: "resource",
            name: binding.name.clone(),
        });
    }

    let options = match &binding.options {
        Some(options) => Arc::new(options.clone()),
        None => Arc::clone(defaults),
    };
    let allocate = registry.get_type(&binding.generator)?;
    let mut generator = allocate(options, &binding.split_args())?;
    generator.set_name(binding.name.clone());

    let generator: Arc<dyn Generator> = Arc::from(generator);
    generator.prepare().await?;
    registry.add_instance(Arc::clone(&generator))?;

    Ok(Resource {
        binding: binding.clone(),
        generator,
    })
}

/// Bind every declaration, skipping the ones that fail recoverably.
///
/// Registration conflicts abort the whole binding.
pub async fn bind_resources(
    registry: &Registry,
    defaults: &Arc<GeneratorOptions>,
    bindings: &[ResourceBinding],
) -> Result<BoundResources, GeneratorError> {
    let mut bound = BoundResources::default();
    for binding in bindings {
        match bind_resource(registry, defaults, binding).await {
            Ok(resource) => {
                info!(
                    event = "resource_bound",
                    resource = %binding.name,
                    generator = %binding.generator,
                    args = %binding.args
                );
                bound.active.push(resource);
            }
            Err(error) if error.is_binding_recoverable() => {
                warn!(
                    event = "resource_skipped",
                    resource = %binding.name,
                    generator = %binding.generator,
                    args = %binding.args,
                    error = %error
                );
                bound.skipped.push(SkippedResource {
                    binding: binding.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }
    Ok(bound)
}
