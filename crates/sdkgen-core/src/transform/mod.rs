mod classifier;
pub mod name_normalizer;
pub mod spec_to_ir;

pub use name_normalizer::{NameRegistry, normalize, route_to_name};
pub use spec_to_ir::{TransformOptions, transform, transform_with_options};
