use log::debug;
use sdkgen_core::config::SdkgenConfig;
use sdkgen_core::ir::{Grouping, IrSpec};
use sdkgen_core::error::GeneratorError;
use sdkgen_core::{CodeGenerator, GeneratedFile};

use crate::emitters;

/// Knobs for the emitted package.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Defaults to the member-style API title.
    pub package_name: Option<String>,
    /// Overrides the first declared server as the constructor default.
    pub base_url: Option<String>,
    pub timeout: f64,
    pub docstrings: bool,
    pub include_tests: bool,
    /// Module the client imports model classes from.
    pub models_module: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from_config(&SdkgenConfig::default())
    }
}

impl EmitOptions {
    pub fn from_config(config: &SdkgenConfig) -> Self {
        Self {
            package_name: config.package_name.clone(),
            base_url: config.client.base_url.clone(),
            timeout: config.client.timeout,
            docstrings: config.client.docstrings,
            include_tests: config.include_tests,
            models_module: config.model_compiler.module.clone(),
        }
    }
}

/// Python client generator (httpx transport, pydantic models).
#[derive(Debug, Clone, Default)]
pub struct PythonClientGenerator {
    pub options: EmitOptions,
}

impl PythonClientGenerator {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    pub fn package_name(&self, grouping: &Grouping) -> String {
        self.options
            .package_name
            .clone()
            .unwrap_or_else(|| grouping.root.member_name.clone())
    }
}

impl CodeGenerator for PythonClientGenerator {
    fn generate(
        &self,
        ir: &IrSpec,
        grouping: &Grouping,
    ) -> Result<Vec<GeneratedFile>, GeneratorError> {
        let package = self.package_name(grouping);
        let mut files = emitters::client::emit_client(ir, grouping, &self.options, &package)?;
        files.push(emitters::manifest::emit_requirements());
        if self.options.include_tests {
            files.extend(emitters::tests::emit_tests(ir, grouping, &package)?);
        }
        debug!("emitted {} file(s) for package `{package}`", files.len());
        Ok(files)
    }
}
