use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use super::name_normalizer::{NameRegistry, route_to_name};
use super::spec_to_ir::TransformOptions;
use crate::config::NamingStrategy;
use crate::error::TransformError;
use crate::ir::{
    BodyContent, Diagnostic, HeaderScope, HttpMethod, IrOperation, IrParameter, IrRequestBody,
    IrResponse, NameBinding, ParameterRole, ResponseShape, ReturnType, StatusCode,
};
use crate::parse::OpenApiSpec;
use crate::parse::operation::{MediaType, Operation, Parameter, ParameterLocation};
use crate::parse::security::SecurityScheme;
use crate::resolve::{ResolutionContext, ResolvedSchema, SchemaKind};

pub(crate) const BODY_PARAM: &str = "request_body";

/// An operation with its path-level parameters merged in, before classification.
pub(crate) struct PendingOperation<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub operation: &'a Operation,
    pub parameters: Vec<&'a Parameter>,
}

/// Collect every operation in document order, merging path-level parameters.
/// Operation-level parameters replace path-level ones with the same name and location.
pub(crate) fn collect_operations<'a>(
    spec: &'a OpenApiSpec,
    ctx: &ResolutionContext<'a>,
) -> Result<Vec<PendingOperation<'a>>, TransformError> {
    let mut pending = Vec::new();
    for (path, item) in &spec.paths {
        let shared = item
            .parameters
            .iter()
            .map(|p| ctx.resolve_parameter(p))
            .collect::<Result<Vec<_>, _>>()?;

        for (method, operation) in item.operations() {
            let mut parameters = shared.clone();
            for p in &operation.parameters {
                let param = ctx.resolve_parameter(p)?;
                match parameters
                    .iter()
                    .position(|existing| existing.identity() == param.identity())
                {
                    Some(i) => parameters[i] = param,
                    None => parameters.push(param),
                }
            }
            pending.push(PendingOperation {
                path,
                method,
                operation,
                parameters,
            });
        }
    }
    Ok(pending)
}

/// Lowercased header names declared by header-borne security schemes.
pub(crate) fn scheme_headers(schemes: &IndexMap<String, SecurityScheme>) -> HashSet<String> {
    schemes
        .values()
        .filter_map(SecurityScheme::header_name)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Lowercased header names present on at least two operations and on at
/// least `ratio` of all operations.
pub(crate) fn headers_by_presence(operations: &[PendingOperation<'_>], ratio: f64) -> HashSet<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for op in operations {
        let names: HashSet<String> = op
            .parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Header)
            .map(|p| p.name.to_ascii_lowercase())
            .collect();
        for name in names {
            *counts.entry(name).or_default() += 1;
        }
    }
    let total = operations.len() as f64;
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2 && *count as f64 >= ratio * total)
        .map(|(name, _)| name)
        .collect()
}

/// Per-run classification state.
pub(crate) struct Classifier<'o> {
    pub options: &'o TransformOptions,
    pub names: NameRegistry,
    pub constructor_headers: HashSet<String>,
    pub diagnostics: Vec<Diagnostic>,
    constructor_bindings: HashMap<String, NameBinding>,
    seen_ids: HashMap<String, String>,
}

impl<'o> Classifier<'o> {
    pub fn new(
        options: &'o TransformOptions,
        names: NameRegistry,
        constructor_headers: HashSet<String>,
    ) -> Self {
        Self {
            options,
            names,
            constructor_headers,
            diagnostics: Vec::new(),
            constructor_bindings: HashMap::new(),
            seen_ids: HashMap::new(),
        }
    }

    pub fn classify<'a>(
        &mut self,
        pending: &PendingOperation<'a>,
        ctx: &mut ResolutionContext<'a>,
    ) -> Result<IrOperation, TransformError> {
        let op = pending.operation;
        let location = format!("{} {}", pending.method, pending.path);

        let id = self.operation_id(pending);
        if let Some(first) = self.seen_ids.insert(id.clone(), location.clone()) {
            return Err(TransformError::DuplicateOperation {
                operation: id,
                first,
                second: location,
            });
        }
        let name = self.names.bind("operations", &id)?;
        let tag = self.assign_tag(&id, pending)?;

        let signature_scope = format!("signature:{id}");
        let mut parameters = Vec::with_capacity(pending.parameters.len() + 1);
        for param in &pending.parameters {
            let role = match param.location {
                ParameterLocation::Header => ParameterRole::Header,
                ParameterLocation::Path => ParameterRole::Path,
                ParameterLocation::Query => ParameterRole::Query,
                ParameterLocation::Cookie => {
                    self.diagnostics.push(Diagnostic::CookieParameterSkipped {
                        operation: id.clone(),
                        parameter: param.name.clone(),
                    });
                    continue;
                }
            };
            let shape = match &param.schema {
                Some(schema) => ctx.resolve_schema_or_ref(schema)?,
                None => Arc::new(ResolvedSchema::anonymous(SchemaKind::Any)),
            };
            let header_scope = if role == ParameterRole::Header
                && self
                    .constructor_headers
                    .contains(&param.name.to_ascii_lowercase())
            {
                HeaderScope::Constructor
            } else {
                HeaderScope::Call
            };
            let binding = match header_scope {
                HeaderScope::Constructor => self.constructor_binding(&param.name)?,
                HeaderScope::Call => self.names.bind_as(
                    &signature_scope,
                    &format!("{role}:{}", param.name),
                    &param.name,
                )?,
            };
            parameters.push(IrParameter {
                name: binding,
                original_name: param.name.clone(),
                role,
                required: param.required || role == ParameterRole::Path,
                shape,
                description: param.description.clone(),
                header_scope,
            });
        }

        let request_body = match &op.request_body {
            Some(body) => {
                let body = ctx.resolve_request_body(body)?;
                let (media_type, media) = pick_media_type(&body.content);
                let content = body_content(&media_type);
                let shape = match (media.and_then(|m| m.schema.as_ref()), &content) {
                    (Some(schema), _) => ctx.resolve_schema_or_ref(schema)?,
                    (None, BodyContent::Text) => Arc::new(ResolvedSchema::anonymous(
                        SchemaKind::String { format: None },
                    )),
                    (None, _) => Arc::new(ResolvedSchema::anonymous(SchemaKind::Any)),
                };
                let dependencies = match &content {
                    BodyContent::Json => shape.dependencies(),
                    BodyContent::Text | BodyContent::Other(_) => Vec::new(),
                };
                parameters.push(IrParameter {
                    name: self.names.bind_as(
                        &signature_scope,
                        &format!("{}:{BODY_PARAM}", ParameterRole::Body),
                        BODY_PARAM,
                    )?,
                    original_name: BODY_PARAM.to_string(),
                    role: ParameterRole::Body,
                    required: body.required,
                    shape: Arc::clone(&shape),
                    description: body.description.clone(),
                    header_scope: HeaderScope::Call,
                });
                Some(IrRequestBody {
                    required: body.required,
                    content,
                    media_type,
                    shape,
                    description: body.description.clone(),
                    dependencies,
                })
            }
            None => None,
        };

        // Stable: document order survives inside each (role, required) bucket.
        parameters.sort_by_key(|p| (p.role, !p.required));

        let mut responses = Vec::with_capacity(op.responses.len());
        for (status, response) in &op.responses {
            let Some(status) = StatusCode::parse(status) else {
                debug!("{id}: ignoring unrecognized response key `{status}`");
                continue;
            };
            let response = ctx.resolve_response(response)?;
            let (media_type, media) = pick_media_type(&response.content);
            let (shape, content) = match media {
                None => (ResponseShape::NoContent, None),
                Some(media) => {
                    let content = body_content(&media_type);
                    let shape = match (&media.schema, &content) {
                        (Some(schema), _) => ctx.resolve_schema_or_ref(schema)?,
                        (None, BodyContent::Text) => Arc::new(ResolvedSchema::anonymous(
                            SchemaKind::String { format: None },
                        )),
                        (None, _) => Arc::new(ResolvedSchema::anonymous(SchemaKind::Any)),
                    };
                    (ResponseShape::Content(shape), Some(content))
                }
            };
            responses.push(IrResponse {
                status,
                shape,
                content,
                description: response.description.clone(),
            });
        }
        responses.sort_by_key(|r| r.status);
        let return_type = ReturnType::from_responses(&responses);

        debug!(
            "classified {id} ({location}) → tag `{}`, {} parameter(s), {} response(s)",
            tag.original,
            parameters.len(),
            responses.len()
        );

        Ok(IrOperation {
            id,
            name,
            tag,
            method: pending.method,
            path: pending.path.to_string(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            deprecated: op.deprecated,
            parameters,
            request_body,
            responses,
            return_type,
            skip_auth: op.security.as_ref().is_some_and(Vec::is_empty),
        })
    }

    fn operation_id(&self, pending: &PendingOperation<'_>) -> String {
        let raw = match (self.options.naming_strategy, &pending.operation.operation_id) {
            (NamingStrategy::UseOperationId, Some(id)) => id.clone(),
            _ => route_to_name(pending.method, pending.path),
        };
        self.options.aliases.get(&raw).cloned().unwrap_or(raw)
    }

    fn assign_tag(
        &mut self,
        id: &str,
        pending: &PendingOperation<'_>,
    ) -> Result<NameBinding, TransformError> {
        if let Some(tag) = pending.operation.tags.first() {
            return self.names.bind("tags", tag);
        }
        match &self.options.default_tag {
            Some(tag) => {
                self.diagnostics.push(Diagnostic::DefaultTagAssigned {
                    operation: id.to_string(),
                    tag: tag.clone(),
                });
                self.names.bind("tags", tag)
            }
            None => Err(TransformError::UntaggedOperation {
                operation: id.to_string(),
                method: pending.method.to_string(),
                path: pending.path.to_string(),
            }),
        }
    }

    /// One binding per header, whatever its spelling on individual operations.
    pub fn constructor_binding(&mut self, header: &str) -> Result<NameBinding, TransformError> {
        let key = header.to_ascii_lowercase();
        if let Some(binding) = self.constructor_bindings.get(&key) {
            return Ok(binding.clone());
        }
        let binding = self.names.bind("constructor", header)?;
        self.constructor_bindings.insert(key, binding.clone());
        Ok(binding)
    }
}

/// JSON first (including `+json` suffixes), then text, then whatever is listed first.
fn pick_media_type(content: &IndexMap<String, MediaType>) -> (String, Option<&MediaType>) {
    let pick = content
        .iter()
        .find(|(mt, _)| body_content(mt) == BodyContent::Json)
        .or_else(|| {
            content
                .iter()
                .find(|(mt, _)| body_content(mt) == BodyContent::Text)
        })
        .or_else(|| content.first());
    match pick {
        Some((mt, media)) => (mt.clone(), Some(media)),
        None => ("application/json".to_string(), None),
    }
}

fn body_content(media_type: &str) -> BodyContent {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence == "application/json" || essence.ends_with("+json") {
        BodyContent::Json
    } else if essence.starts_with("text/") {
        BodyContent::Text
    } else {
        BodyContent::Other(essence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_content() {
        assert_eq!(body_content("application/json"), BodyContent::Json);
        assert_eq!(
            body_content("application/merge-patch+json; charset=utf-8"),
            BodyContent::Json
        );
        assert_eq!(body_content("text/plain"), BodyContent::Text);
        assert_eq!(
            body_content("application/octet-stream"),
            BodyContent::Other("application/octet-stream".to_string())
        );
    }

    #[test]
    fn test_pick_media_type_prefers_json() {
        let content: IndexMap<String, MediaType> = serde_yaml_ng::from_str(
            r#"
text/plain: {schema: {type: string}}
application/json: {schema: {type: object}}
"#,
        )
        .unwrap();
        assert_eq!(pick_media_type(&content).0, "application/json");

        let empty = IndexMap::new();
        let (_, media) = pick_media_type(&empty);
        assert!(media.is_none());
    }
}
