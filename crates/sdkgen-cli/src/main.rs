use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;

use sdkgen_core::config::{self, CONFIG_FILE_NAME, SdkgenConfig};
use sdkgen_core::ir::{Grouping, GroupingMode, IrSpec, group_operations};
use sdkgen_core::parse::{self, OpenApiSpec};
use sdkgen_core::transform::{TransformOptions, transform_with_options};
use sdkgen_python_client::{
    DatamodelCodegen, ModelCompiler, ModelsOutcome, PYTHON_RESERVED, pipeline,
};

#[derive(Parser)]
#[command(name = "sdkgen", about = "OpenAPI 3.x to typed Python client generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Python client package from an OpenAPI spec
    Generate(GenerateArgs),

    /// Validate an OpenAPI spec and report what would be generated
    Validate {
        /// Path to the OpenAPI spec file (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the operation grouping the generator would emit
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Write a default .sdkgen.yaml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the OpenAPI spec file (YAML or JSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the client package
    #[arg(long)]
    sdk_output: Option<PathBuf>,

    /// Directory for the compiled models module
    #[arg(long)]
    models_output: Option<PathBuf>,

    /// Put every operation on the root client
    #[arg(long, conflicts_with = "tag_partitioned")]
    flat: bool,

    /// One class per tag behind the root client
    #[arg(long)]
    tag_partitioned: bool,

    /// Emit pytest scaffolding
    #[arg(long)]
    tests: bool,

    /// Do not run the model compiler
    #[arg(long)]
    skip_models: bool,
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => cmd_generate(args),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "sdkgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load `.sdkgen.yaml` from the current directory, falling back to defaults.
fn load_config() -> Result<SdkgenConfig> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    let cfg = config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))?;
    if cfg.is_none() {
        debug!("no {CONFIG_FILE_NAME} found, using defaults");
    }
    Ok(cfg.unwrap_or_default())
}

fn read_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse::from_path_content(path, &content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn load_ir(path: &Path, cfg: &SdkgenConfig) -> Result<(OpenApiSpec, IrSpec)> {
    let spec = read_spec(path)?;
    let options =
        TransformOptions::from_config(cfg).with_reserved_words(PYTHON_RESERVED.iter().copied());
    let ir = transform_with_options(&spec, &options)
        .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;
    Ok((spec, ir))
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let mut cfg = load_config()?;
    if let Some(input) = args.input {
        cfg.input = path_string(input);
    }
    if let Some(dir) = args.sdk_output {
        cfg.sdk_output_path = path_string(dir);
    }
    if let Some(dir) = args.models_output {
        cfg.models_output_path = path_string(dir);
    }
    if args.flat {
        cfg.tag_partitioned = false;
    } else if args.tag_partitioned {
        cfg.tag_partitioned = true;
    }
    if args.tests {
        cfg.include_tests = true;
    }

    eprintln!("Generating {} → {}", cfg.input, cfg.sdk_output_path);
    let compiler = DatamodelCodegen::from_config(&cfg.model_compiler);
    let compiler: Option<&dyn ModelCompiler> = if args.skip_models {
        None
    } else {
        Some(&compiler)
    };
    let report = pipeline::run(&cfg, compiler)
        .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;

    for diagnostic in &report.diagnostics {
        eprintln!("  warning: {diagnostic}");
    }
    for path in &report.written {
        eprintln!("  wrote {}", path.display());
    }
    match &report.models {
        ModelsOutcome::Compiled(path) => eprintln!("  models → {}", path.display()),
        ModelsOutcome::Skipped => eprintln!(
            "  note: models not compiled; provide `{}` before importing the client",
            cfg.model_compiler.module
        ),
        ModelsOutcome::Ignored => eprintln!("  note: models path is ignored by config"),
    }
    eprintln!(
        "Generated package `{}`: {} operations in {} group(s), {} files",
        report.package,
        report.operations,
        report.groups,
        report.written.len()
    );
    Ok(())
}

fn cmd_validate(input: Option<PathBuf>) -> Result<()> {
    let cfg = load_config()?;
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let (spec, ir) = load_ir(&input, &cfg)?;

    eprintln!("Valid OpenAPI {} spec: {}", spec.openapi, spec.info.title);
    eprintln!("  Version: {}", spec.info.version);
    eprintln!("  Paths: {}", spec.paths.len());
    eprintln!("  Schemas: {}", ir.schemas.len());
    eprintln!("  Operations: {}", ir.operations.len());
    eprintln!("  Auth schemes: {}", ir.auth_schemes.len());
    for diagnostic in &ir.diagnostics {
        eprintln!("  warning: {diagnostic}");
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: Option<PathBuf>, format: InspectFormat) -> Result<()> {
    let cfg = load_config()?;
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let (_, ir) = load_ir(&input, &cfg)?;
    let grouping = group_operations(&ir, GroupingMode::from_flag(cfg.tag_partitioned));

    let summary = build_inspect_summary(&ir, &grouping);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(ir: &IrSpec, grouping: &Grouping) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = grouping
        .groups
        .iter()
        .map(|group| {
            let operations: Vec<serde_json::Value> = group
                .operations
                .iter()
                .filter_map(|&i| ir.operations.get(i).map(|op| (i, op)))
                .map(|(i, op)| {
                    serde_json::json!({
                        "id": op.id,
                        "method": op.method.as_str(),
                        "path": op.path,
                        "access": grouping.attribute_path(ir, i),
                        "signature": op
                            .signature()
                            .iter()
                            .map(|p| format!("{} ({})", p.name.member_name, p.role))
                            .collect::<Vec<_>>(),
                        "statuses": op
                            .responses
                            .iter()
                            .map(|r| r.status.to_string())
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            serde_json::json!({
                "name": group.name.original,
                "class": format!("{}Client", group.name.type_name),
                "operations": operations,
            })
        })
        .collect();

    let constructor: Vec<serde_json::Value> = grouping
        .constructor
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name.member_name,
                "header": c.header,
                "required": c.required,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": ir.info.title.original,
            "version": ir.info.version,
        },
        "mode": match grouping.mode {
            GroupingMode::Flat => "flat",
            GroupingMode::TagPartitioned => "tag_partitioned",
        },
        "root": format!("{}Client", grouping.root.type_name),
        "constructor": constructor,
        "groups": groups,
        "diagnostics": ir.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
