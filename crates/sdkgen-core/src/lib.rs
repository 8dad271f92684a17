pub mod config;
pub mod error;
pub mod ir;
pub mod output;
pub mod parse;
pub mod resolve;
pub mod transform;

/// A generated file, addressed relative to its output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A target-language emitter turning a classified, grouped document into source files.
pub trait CodeGenerator {
    fn generate(
        &self,
        ir: &ir::IrSpec,
        grouping: &ir::Grouping,
    ) -> Result<Vec<GeneratedFile>, error::GeneratorError>;
}
