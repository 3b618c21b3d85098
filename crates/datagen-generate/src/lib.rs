//! Generator engine for datagen.
//!
//! Resources are bound to generators through a [`Registry`] of allocators;
//! the [`Pipeline`] then drives every requested generator concurrently and
//! streams formatted values to an output.

pub mod binding;
pub mod errors;
pub mod generators;
pub mod output;
pub mod pipeline;
pub mod registry;

pub use binding::{
    BoundResources, Resource, ResourceBinding, SkippedResource, bind_resource, bind_resources,
    register_builtin_types,
};
pub use errors::{GeneratorError, PipelineError};
pub use generators::{Generator, Trail, ValueSource};
pub use output::{
    CollectingEmitter, Emitter, JsonFormatter, OutputFormat, OutputFormatter, StdoutEmitter,
    TextFormatter,
};
pub use pipeline::{GeneratedItem, Pipeline, PipelineReport};
pub use registry::{Allocator, Instances, Registry, Resolve, allocator};
