use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Resolve,
    Normalize,
    Classify,
    Emit,
    Compile,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Resolve => "resolve",
            Stage::Normalize => "normalize",
            Stage::Classify => "classify",
            Stage::Emit => "emit",
            Stage::Compile => "compile",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference leaves the current document (`other.yaml#/...`, URLs).
    #[error("unsupported reference `{0}`: only same-document references are allowed")]
    UnsupportedReference(String),

    /// A same-document reference whose target does not exist.
    #[error("unresolvable reference `{0}`")]
    Unresolvable(String),

    #[error("invalid reference `{reference}`: expected a #/components/{expected}/ pointer")]
    InvalidReference { reference: String, expected: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(
        "name collision in {scope}: `{first}` and `{second}` both normalize to `{identifier}`"
    )]
    NameCollision {
        scope: String,
        first: String,
        second: String,
        identifier: String,
    },

    #[error("operation `{operation}` ({method} {path}) has no tag and the default tag is disabled")]
    UntaggedOperation {
        operation: String,
        method: String,
        path: String,
    },

    #[error("operation id `{operation}` is used by both {first} and {second}")]
    DuplicateOperation {
        operation: String,
        first: String,
        second: String,
    },
}

impl TransformError {
    pub fn stage(&self) -> Stage {
        match self {
            TransformError::Parse(_) => Stage::Parse,
            TransformError::Resolve(_) => Stage::Resolve,
            TransformError::NameCollision { .. } => Stage::Normalize,
            TransformError::UntaggedOperation { .. } | TransformError::DuplicateOperation { .. } => {
                Stage::Classify
            }
        }
    }
}

/// Errors raised by code generators and the generation pipeline.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("template rendering failed: {0}")]
    Render(String),

    #[error("model compiler `{program}` failed: {reason}")]
    ExternalCompiler { program: String, reason: String },

    #[error("invalid ignore pattern `{pattern}`: {reason}")]
    InvalidIgnorePattern { pattern: String, reason: String },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    pub fn stage(&self) -> Stage {
        match self {
            GeneratorError::Transform(e) => e.stage(),
            GeneratorError::Render(_) => Stage::Emit,
            GeneratorError::ExternalCompiler { .. } => Stage::Compile,
            GeneratorError::InvalidIgnorePattern { .. } | GeneratorError::Io { .. } => Stage::Write,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ParseError> for GeneratorError {
    fn from(e: ParseError) -> Self {
        GeneratorError::Transform(TransformError::Parse(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_of_collision() {
        let err = TransformError::NameCollision {
            scope: "tags".to_string(),
            first: "Chunk Group".to_string(),
            second: "chunk-group".to_string(),
            identifier: "chunk_group".to_string(),
        };
        assert_eq!(err.stage(), Stage::Normalize);
        assert!(err.to_string().contains("`Chunk Group`"));
        assert!(err.to_string().contains("chunk_group"));
    }

    #[test]
    fn test_generator_error_wraps_stage() {
        let err: GeneratorError =
            TransformError::Resolve(ResolveError::UnsupportedReference("a.yaml#/X".into())).into();
        assert_eq!(err.stage(), Stage::Resolve);
        assert_eq!(err.stage().to_string(), "resolve");
    }
}
