//! Mapping models, the conventional registry, and structural inference.

mod infer;
mod model;
mod registry;

pub use infer::{can_infer, infer_mapping, AttributeChange, EntityDiff, ModelDiff};
pub use model::{AttributeMapping, AttributeTransform, EntityMapping, MappingModel};
pub use registry::{MappingError, MappingRegistry};
