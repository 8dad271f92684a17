pub mod emitters;
pub mod generator;
pub mod models;
pub mod pipeline;
pub mod type_mapper;

pub use generator::{EmitOptions, PythonClientGenerator};
pub use models::{DatamodelCodegen, ModelCompiler};
pub use pipeline::{GenerationReport, ModelsOutcome, run};

/// Identifiers that cannot be used as Python names (keywords, soft keywords
/// that break as parameters, and `self`). Matching names get a `_` suffix.
pub const PYTHON_RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "self",
];
