use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use sdkgen_core::config::SdkgenConfig;
use sdkgen_core::error::GeneratorError;
use sdkgen_core::ir::{Diagnostic, GroupingMode, group_operations};
use sdkgen_core::output::{IgnoreSet, StagedOutput};
use sdkgen_core::parse::{self, OpenApiSpec};
use sdkgen_core::transform::{TransformOptions, transform_with_options};
use sdkgen_core::{CodeGenerator, GeneratedFile};

use crate::PYTHON_RESERVED;
use crate::generator::{EmitOptions, PythonClientGenerator};
use crate::models::ModelCompiler;

/// What happened to the models module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelsOutcome {
    Compiled(PathBuf),
    /// Disabled in config or no compiler supplied.
    Skipped,
    /// The models path matched an `ignores` pattern.
    Ignored,
}

/// Summary of a successful run.
#[derive(Debug)]
pub struct GenerationReport {
    pub package: String,
    pub operations: usize,
    pub groups: usize,
    pub written: Vec<PathBuf>,
    pub models: ModelsOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

/// Read `config.input` and generate the client it describes.
pub fn run(
    config: &SdkgenConfig,
    compiler: Option<&dyn ModelCompiler>,
) -> Result<GenerationReport, GeneratorError> {
    let input = Path::new(&config.input);
    let content = fs::read_to_string(input).map_err(|e| GeneratorError::io(input, e))?;
    let spec = parse::from_path_content(input, &content)?;
    generate(&spec, config, compiler)
}

/// Generate from a parsed document. Everything is staged first; the output
/// directories are only touched once every step has succeeded.
pub fn generate(
    spec: &OpenApiSpec,
    config: &SdkgenConfig,
    compiler: Option<&dyn ModelCompiler>,
) -> Result<GenerationReport, GeneratorError> {
    let options =
        TransformOptions::from_config(config).with_reserved_words(PYTHON_RESERVED.iter().copied());
    let ir = transform_with_options(spec, &options)?;
    let grouping = group_operations(&ir, GroupingMode::from_flag(config.tag_partitioned));

    let generator = PythonClientGenerator::new(EmitOptions::from_config(config));
    let package = generator.package_name(&grouping);
    let files = generator.generate(&ir, &grouping)?;

    let sdk_root = Path::new(&config.sdk_output_path);
    let mut staged = StagedOutput::new(sdk_root, IgnoreSet::new(&config.ignores)?)?;
    for file in &files {
        staged.stage(sdk_root, file)?;
    }

    let models = match compiler {
        Some(compiler) if config.model_compiler.enabled => {
            compile_models(spec, config, compiler, &mut staged)?
        }
        _ => {
            warn!(
                "model compilation skipped; `{}` must be provided separately",
                config.model_compiler.module
            );
            ModelsOutcome::Skipped
        }
    };

    let written = staged.promote()?;
    info!(
        "generated package `{package}`: {} operation(s) in {} group(s), {} file(s)",
        ir.operations.len(),
        grouping.groups.len(),
        written.len()
    );

    Ok(GenerationReport {
        package,
        operations: ir.operations.len(),
        groups: grouping.groups.len(),
        written,
        models,
        diagnostics: ir.diagnostics,
    })
}

fn compile_models(
    spec: &OpenApiSpec,
    config: &SdkgenConfig,
    compiler: &dyn ModelCompiler,
    staged: &mut StagedOutput,
) -> Result<ModelsOutcome, GeneratorError> {
    let models_root = Path::new(&config.models_output_path);
    let module = config
        .model_compiler
        .module
        .rsplit('.')
        .next()
        .unwrap_or("models");
    let module_file = format!("{module}.py");

    let Some(target) = staged.reserve(models_root, &module_file)? else {
        return Ok(ModelsOutcome::Ignored);
    };

    let schema_file = staged.scratch_path("openapi.json");
    if let Some(parent) = schema_file.parent() {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
    }
    let document =
        serde_json::to_vec_pretty(spec).map_err(|e| GeneratorError::io(&schema_file, e.into()))?;
    fs::write(&schema_file, document).map_err(|e| GeneratorError::io(&schema_file, e))?;

    compiler.compile(&schema_file, &target)?;
    if !target.is_file() {
        return Err(GeneratorError::ExternalCompiler {
            program: compiler.program().to_string(),
            reason: format!("no models written to {}", target.display()),
        });
    }
    staged.stage(models_root, &GeneratedFile::new("__init__.py", ""))?;
    Ok(ModelsOutcome::Compiled(models_root.join(module_file)))
}
