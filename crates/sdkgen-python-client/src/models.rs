use std::path::Path;
use std::process::Command;

use log::{debug, info};
use sdkgen_core::config::ModelCompilerConfig;
use sdkgen_core::error::GeneratorError;

/// Turns the document's schemas into a Python models module.
pub trait ModelCompiler {
    /// Read the JSON document at `schema_file` and write models to `output_file`.
    fn compile(&self, schema_file: &Path, output_file: &Path) -> Result<(), GeneratorError>;

    /// Program name for error reporting.
    fn program(&self) -> &str;
}

/// Flags every `datamodel-codegen` run gets, before any configured extras.
const FIXED_FLAGS: &[&str] = &[
    "--input-file-type",
    "openapi",
    "--output-model-type",
    "pydantic_v2.BaseModel",
    "--use-standard-collections",
    "--use-union-operator",
    "--strict-nullable",
    "--field-constraints",
    "--use-annotated",
    "--use-schema-description",
    "--disable-timestamp",
];

/// `datamodel-codegen` run as a subprocess.
#[derive(Debug, Clone)]
pub struct DatamodelCodegen {
    program: String,
    extra_args: Vec<String>,
}

impl DatamodelCodegen {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ModelCompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    fn command(&self, schema_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--input")
            .arg(schema_file)
            .arg("--output")
            .arg(output_file)
            .args(FIXED_FLAGS)
            .args(&self.extra_args);
        cmd
    }

    fn failure(&self, reason: impl Into<String>) -> GeneratorError {
        GeneratorError::ExternalCompiler {
            program: self.program.clone(),
            reason: reason.into(),
        }
    }
}

impl ModelCompiler for DatamodelCodegen {
    fn compile(&self, schema_file: &Path, output_file: &Path) -> Result<(), GeneratorError> {
        let mut cmd = self.command(schema_file, output_file);
        debug!("running {cmd:?}");
        let output = cmd
            .output()
            .map_err(|e| self.failure(format!("could not start: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{} ({})", output.status, stderr.trim())));
        }
        info!("compiled models into {}", output_file.display());
        Ok(())
    }

    fn program(&self) -> &str {
        &self.program
    }
}
