use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

/// Top-level project configuration loaded from `.sdkgen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SdkgenConfig {
    pub input: String,
    pub sdk_output_path: String,
    pub models_output_path: String,
    /// Emit one class per tag behind a root facade instead of one flat class.
    pub tag_partitioned: bool,
    pub include_tests: bool,
    pub name_collision_policy: NameCollisionPolicy,
    /// Python package name for the emitted client (defaults to the normalized API title).
    pub package_name: Option<String>,
    pub naming: NamingConfig,
    pub default_tag: DefaultTagConfig,
    pub resolver: ResolverConfig,
    pub classifier: ClassifierConfig,
    pub client: ClientConfig,
    pub model_compiler: ModelCompilerConfig,
    /// Regex patterns; generated paths matching any of them are never written.
    pub ignores: Vec<String>,
}

impl Default for SdkgenConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            sdk_output_path: "generated_sdk".to_string(),
            models_output_path: "generated_sdk/models".to_string(),
            tag_partitioned: true,
            include_tests: false,
            name_collision_policy: NameCollisionPolicy::Fatal,
            package_name: None,
            naming: NamingConfig::default(),
            default_tag: DefaultTagConfig::default(),
            resolver: ResolverConfig::default(),
            classifier: ClassifierConfig::default(),
            client: ClientConfig::default(),
            model_compiler: ModelCompilerConfig::default(),
            ignores: Vec::new(),
        }
    }
}

/// What happens when two names normalize to the same identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCollisionPolicy {
    #[default]
    Fatal,
}

/// Naming strategy and aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Fallback tag for operations that declare none.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultTagConfig {
    pub enabled: bool,
    pub name: String,
}

impl Default for DefaultTagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Nested `$ref` expansions deeper than this become reference markers.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Share of operations a header must appear on to be lifted into the
    /// client constructor. Only used when the document declares no security schemes.
    pub constructor_header_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            constructor_header_ratio: 0.5,
        }
    }
}

/// Emitted client options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub timeout: f64,
    pub docstrings: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: 10.0,
            docstrings: true,
        }
    }
}

/// External schema-to-model compiler invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelCompilerConfig {
    pub enabled: bool,
    pub program: String,
    /// Python module the emitted client imports models from.
    pub module: String,
    pub extra_args: Vec<String>,
}

impl Default for ModelCompilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "datamodel-codegen".to_string(),
            module: "models.models".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".sdkgen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<SdkgenConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: SdkgenConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    if !(0.0..=1.0).contains(&config.classifier.constructor_header_ratio) {
        return Err(format!(
            "invalid config {}: classifier.constructor_header_ratio must be within 0.0..=1.0",
            path.display()
        ));
    }
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# sdkgen configuration
input: openapi.yaml
sdk_output_path: generated_sdk
models_output_path: generated_sdk/models
tag_partitioned: true      # one class per tag behind a root facade; false = one flat class
include_tests: false       # emit pytest scaffolding per output unit
name_collision_policy: fatal
# package_name: my_api     # defaults to the normalized API title

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  aliases: {}
    # createChunk: create     # operationId -> custom name

default_tag:
  enabled: true            # untagged operations fall back to this tag instead of failing
  name: default

resolver:
  max_depth: 32

classifier:
  constructor_header_ratio: 0.5  # only used when no securitySchemes are declared

client:
  # base_url: https://api.example.com
  timeout: 10.0
  docstrings: true

model_compiler:
  enabled: true
  program: datamodel-codegen
  module: models.models
  extra_args: []

ignores: []                # regex patterns of output paths never to overwrite
"#
}
