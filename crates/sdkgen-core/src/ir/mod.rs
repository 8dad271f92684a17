pub mod grouping;
pub mod operations;
pub mod types;

pub use grouping::{
    ConstructorParam, ConstructorSource, Grouping, GroupingMode, OperationGroup, group_operations,
};
pub use operations::*;
pub use types::{AuthScheme, Diagnostic, IrInfo, IrServer, IrSpec, NameBinding};
