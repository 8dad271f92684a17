use indexmap::IndexMap;
use log::{debug, info, warn};

use super::classifier::{Classifier, collect_operations, headers_by_presence, scheme_headers};
use super::name_normalizer::NameRegistry;
use crate::config::{NamingStrategy, SdkgenConfig};
use crate::error::TransformError;
use crate::ir::{AuthScheme, Diagnostic, IrInfo, IrServer, IrSpec};
use crate::parse::OpenApiSpec;
use crate::parse::security::{SecuritySchemeType, SecurityScheme};
use crate::resolve::ResolutionContext;

/// Options for the transform phase.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub naming_strategy: NamingStrategy,
    /// Resolved operation name → replacement, applied before normalization.
    pub aliases: IndexMap<String, String>,
    /// Tag for operations that declare none; `None` makes them an error.
    pub default_tag: Option<String>,
    pub max_depth: usize,
    pub constructor_header_ratio: f64,
    /// Identifiers of the target language that need a `_` suffix.
    pub reserved_words: Vec<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::from_config(&SdkgenConfig::default())
    }
}

impl TransformOptions {
    pub fn from_config(config: &SdkgenConfig) -> Self {
        Self {
            naming_strategy: config.naming.strategy,
            aliases: config.naming.aliases.clone(),
            default_tag: config
                .default_tag
                .enabled
                .then(|| config.default_tag.name.clone()),
            max_depth: config.resolver.max_depth,
            constructor_header_ratio: config.classifier.constructor_header_ratio,
            reserved_words: Vec::new(),
        }
    }

    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_words = words.into_iter().map(Into::into).collect();
        self
    }
}

/// Transform a parsed document with default options.
pub fn transform(spec: &OpenApiSpec) -> Result<IrSpec, TransformError> {
    transform_with_options(spec, &TransformOptions::default())
}

/// Resolve, normalize and classify a parsed document.
pub fn transform_with_options(
    spec: &OpenApiSpec,
    options: &TransformOptions,
) -> Result<IrSpec, TransformError> {
    let mut ctx = ResolutionContext::new(spec, options.max_depth);
    let mut names = NameRegistry::new(options.reserved_words.iter().cloned());

    // Phase 1: bind and resolve every schema component
    let mut schemas = IndexMap::new();
    if let Some(components) = &spec.components {
        for name in components.schemas.keys() {
            let binding = names.bind("schemas", name)?;
            ctx.resolve_named(name)?;
            schemas.insert(name.clone(), binding);
        }
    }

    // Phase 2: merge path-level parameters, decide constructor-level headers
    let pending = collect_operations(spec, &ctx)?;
    // Scheme headers are always lifted; presence decides the rest.
    let mut constructor_headers =
        headers_by_presence(&pending, options.constructor_header_ratio);
    if let Some(schemes) = spec.security_schemes() {
        constructor_headers.extend(scheme_headers(schemes));
    }
    debug!("constructor-level headers: {constructor_headers:?}");

    let mut classifier = Classifier::new(options, names, constructor_headers);

    // Phase 3: auth schemes share the constructor scope with lifted headers
    let mut auth_schemes = Vec::new();
    if let Some(schemes) = spec.security_schemes() {
        for (key, scheme) in schemes {
            match scheme.header_name() {
                Some(header) => auth_schemes.push(AuthScheme {
                    scheme: key.clone(),
                    binding: classifier.constructor_binding(key)?,
                    header: header.to_string(),
                    prefix: token_prefix(scheme),
                    required: spec
                        .security
                        .iter()
                        .flatten()
                        .any(|requirement| requirement.contains_key(key)),
                    description: scheme.description.clone(),
                }),
                None => classifier
                    .diagnostics
                    .push(Diagnostic::UnsupportedAuthScheme {
                        scheme: key.clone(),
                    }),
            }
        }
    }

    // Phase 4: classify operations in document order
    let operations = pending
        .iter()
        .map(|p| classifier.classify(p, &mut ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let mut diagnostics: Vec<Diagnostic> = ctx
        .cycles()
        .iter()
        .map(|cycle| Diagnostic::CyclicReference {
            chain: cycle.chain.clone(),
        })
        .collect();
    diagnostics.append(&mut classifier.diagnostics);
    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }

    let title = classifier.names.normalize(&spec.info.title);
    info!(
        "transformed `{}`: {} operation(s), {} schema(s), {} diagnostic(s)",
        spec.info.title,
        operations.len(),
        schemas.len(),
        diagnostics.len()
    );

    Ok(IrSpec {
        info: IrInfo {
            title,
            description: spec.info.description.clone(),
            version: spec.info.version.clone(),
        },
        servers: spec
            .servers
            .iter()
            .map(|s| IrServer {
                url: s.default_url(),
                description: s.description.clone(),
            })
            .collect(),
        operations,
        schemas,
        auth_schemes,
        tag_descriptions: spec
            .tags
            .iter()
            .filter_map(|t| Some((t.name.clone(), t.description.clone()?)))
            .collect(),
        diagnostics,
    })
}

fn token_prefix(scheme: &SecurityScheme) -> Option<String> {
    match scheme.scheme_type {
        SecuritySchemeType::Http
            if scheme
                .scheme
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("bearer")) =>
        {
            Some("Bearer ".to_string())
        }
        SecuritySchemeType::OAuth2 | SecuritySchemeType::OpenIdConnect => {
            Some("Bearer ".to_string())
        }
        _ => None,
    }
}
