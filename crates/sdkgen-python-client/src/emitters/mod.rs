pub mod client;
pub mod manifest;
pub mod tests;

use std::collections::BTreeSet;

use minijinja::Environment;
use serde::Serialize;
use sdkgen_core::error::GeneratorError;
use sdkgen_core::ir::{
    BodyContent, IrOperation, IrParameter, ParameterRole, ResponseShape, ReturnType, StatusCode,
};

use crate::type_mapper::TypeMapper;

const TEMPLATES: &[(&str, &str)] = &[
    ("client.py.j2", include_str!("../../templates/client.py.j2")),
    ("tag.py.j2", include_str!("../../templates/tag.py.j2")),
    ("method.py.j2", include_str!("../../templates/method.py.j2")),
    ("package_init.py.j2", include_str!("../../templates/package_init.py.j2")),
    ("tags_init.py.j2", include_str!("../../templates/tags_init.py.j2")),
    ("conftest.py.j2", include_str!("../../templates/conftest.py.j2")),
    ("test_unit.py.j2", include_str!("../../templates/test_unit.py.j2")),
];

/// Escape backslashes and triple quotes so text cannot end a Python docstring early.
pub fn escape_docstring(value: String) -> String {
    value.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

/// A Python string literal. JSON escapes are valid Python escapes.
pub fn py_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

pub(crate) fn environment() -> Result<Environment<'static>, GeneratorError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("escape_docstring", escape_docstring);
    for (name, source) in TEMPLATES {
        env.add_template(name, source)
            .map_err(|e| GeneratorError::Render(format!("{name}: {e}")))?;
    }
    Ok(env)
}

pub(crate) fn render<S: Serialize>(
    env: &Environment<'_>,
    name: &str,
    ctx: S,
) -> Result<String, GeneratorError> {
    env.get_template(name)
        .and_then(|t| t.render(ctx))
        .map_err(|e| GeneratorError::Render(format!("{name}: {e}")))
}

#[derive(Debug, Serialize)]
pub(crate) struct ParamContext {
    pub name: String,
    /// Python literal of the wire name.
    pub key: String,
    pub annotation: String,
    pub required: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct BodyContext {
    pub name: String,
    /// `json`, `text` or `raw`.
    pub kind: &'static str,
    pub media_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusEntry {
    pub key: String,
    pub runtime: String,
}

/// Everything `method.py.j2` needs for one operation.
#[derive(Debug, Serialize)]
pub(crate) struct MethodContext {
    pub name: String,
    pub http_method: &'static str,
    /// Body of the `f"..."` path expression.
    pub path: String,
    pub params: Vec<ParamContext>,
    pub query: Vec<ParamContext>,
    pub headers: Vec<ParamContext>,
    pub body: Option<BodyContext>,
    pub returns: String,
    pub statuses: Vec<StatusEntry>,
    pub doc: Vec<String>,
    pub skip_auth: bool,
    pub deprecated: bool,
}

impl MethodContext {
    pub fn build(op: &IrOperation, mapper: &TypeMapper<'_>, docstrings: bool) -> Self {
        let param = |p: &IrParameter| ParamContext {
            name: p.name.member_name.clone(),
            key: py_str(&p.original_name),
            annotation: optional(mapper.annotation(&p.shape), p.required),
            required: p.required,
        };
        let signature = op.signature();
        let by_role = |role: ParameterRole| {
            signature
                .iter()
                .filter(|p| p.role == role)
                .map(|&p| param(p))
                .collect::<Vec<_>>()
        };

        let body = op.request_body.as_ref().zip(op.body_param()).map(|(b, p)| BodyContext {
            name: p.name.member_name.clone(),
            kind: match b.content {
                BodyContent::Json => "json",
                BodyContent::Text => "text",
                BodyContent::Other(_) => "raw",
            },
            media_type: b.media_type.clone(),
        });

        Self {
            name: op.name.member_name.clone(),
            http_method: op.method.as_str(),
            path: path_fstring(op),
            params: signature.iter().map(|&p| param(p)).collect(),
            query: by_role(ParameterRole::Query),
            headers: by_role(ParameterRole::Header),
            body,
            returns: return_annotation(op, mapper),
            statuses: status_entries(op, mapper),
            doc: if docstrings {
                method_docstring(op, mapper)
            } else {
                Vec::new()
            },
            skip_auth: op.skip_auth,
            deprecated: op.deprecated,
        }
    }
}

/// Optional parameters default to `None`, so their annotation admits it.
fn optional(annotation: String, required: bool) -> String {
    if required || annotation == "Any" || annotation.ends_with(" | None") {
        annotation
    } else {
        format!("{annotation} | None")
    }
}

/// The path template as f-string content; parameters become member names and
/// every other brace is doubled.
fn path_fstring(op: &IrOperation) -> String {
    let mut out = String::new();
    let mut rest = op.path.as_str();
    while let Some(open) = rest.find('{') {
        out.push_str(&escape_literal(&rest[..open]));
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let raw = &after[..close];
                match op
                    .params_by_role(ParameterRole::Path)
                    .find(|p| p.original_name == raw)
                {
                    Some(p) => {
                        out.push('{');
                        out.push_str(&p.name.member_name);
                        out.push('}');
                    }
                    None => {
                        out.push_str("{{");
                        out.push_str(&escape_literal(raw));
                        out.push_str("}}");
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(&escape_literal(rest));
    out
}

fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('}', "}}")
}

fn return_annotation(op: &IrOperation, mapper: &TypeMapper<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for shape in op.return_type.shapes() {
        let rendered = mapper.annotation(shape);
        for part in rendered.split(" | ") {
            if !parts.iter().any(|p| p == part) {
                parts.push(part.to_string());
            }
        }
    }
    if matches!(op.return_type, ReturnType::NoContent) {
        return "None".to_string();
    }
    if parts.iter().any(|p| p == "Any") {
        return "Any".to_string();
    }
    if op.may_return_nothing() && !parts.iter().any(|p| p == "None") {
        parts.push("None".to_string());
    }
    parts.join(" | ")
}

fn status_entries(op: &IrOperation, mapper: &TypeMapper<'_>) -> Vec<StatusEntry> {
    op.responses
        .iter()
        .map(|r| {
            let key = match r.status {
                StatusCode::Exact(code) => code.to_string(),
                _ => py_str(&r.status.as_key()),
            };
            let runtime = match (&r.shape, &r.content) {
                (ResponseShape::NoContent, _) => "None".to_string(),
                (ResponseShape::Content(_), Some(BodyContent::Text)) => "str".to_string(),
                (ResponseShape::Content(_), Some(BodyContent::Other(_))) => "bytes".to_string(),
                (ResponseShape::Content(shape), _) => mapper.runtime(shape),
            };
            StatusEntry { key, runtime }
        })
        .collect()
}

/// Docstring lines: summary, description, `Args:` and a `Returns:` table.
fn method_docstring(op: &IrOperation, mapper: &TypeMapper<'_>) -> Vec<String> {
    let mut sections: Vec<Vec<String>> = Vec::new();

    let mut head: Vec<String> = Vec::new();
    if op.deprecated {
        head.push("Deprecated.".to_string());
    }
    if let Some(summary) = op.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        head.extend(summary.lines().map(str::to_string));
    }
    sections.push(head);

    if let Some(description) = op.description.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        sections.push(description.lines().map(|l| l.trim_end().to_string()).collect());
    }

    let signature = op.signature();
    if !signature.is_empty() {
        let mut args = vec!["Args:".to_string()];
        for p in signature {
            let text = p
                .description
                .as_deref()
                .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| mapper.annotation(&p.shape));
            args.push(format!("    {}: {}", p.name.member_name, text));
        }
        sections.push(args);
    }

    if !op.responses.is_empty() {
        let mut returns = vec!["Returns:".to_string()];
        for r in &op.responses {
            let shape = match &r.shape {
                ResponseShape::Content(shape) => mapper.annotation(shape),
                ResponseShape::NoContent => "None".to_string(),
            };
            returns.push(format!("    {} → {}", r.status, shape));
        }
        sections.push(returns);
    }

    let mut lines: Vec<String> = Vec::new();
    for section in sections.into_iter().filter(|s| !s.is_empty()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(section.into_iter().map(escape_docstring));
    }
    lines
}

/// Model classes the given operations mention in signatures and return types.
pub(crate) fn model_imports<'o>(
    ops: impl Iterator<Item = &'o IrOperation>,
    mapper: &TypeMapper<'_>,
) -> Vec<String> {
    let mut names = BTreeSet::new();
    for op in ops {
        for p in op.signature() {
            mapper.referenced_models(&p.shape, &mut names);
        }
        for r in &op.responses {
            if let ResponseShape::Content(shape) = &r.shape {
                mapper.referenced_models(shape, &mut names);
            }
        }
    }
    names.into_iter().collect()
}

/// Description text split into escaped docstring lines.
pub(crate) fn doc_lines(text: Option<&str>) -> Vec<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.lines()
                .map(|l| escape_docstring(l.trim_end().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod escape_tests {
    use super::*;

    #[test]
    fn test_escape_docstring() {
        assert_eq!(
            escape_docstring(r#"a """quoted""" C:\path"#.to_string()),
            r#"a \"\"\"quoted\"\"\" C:\\path"#
        );
    }

    #[test]
    fn test_py_str() {
        assert_eq!(py_str("X-API-Version"), "\"X-API-Version\"");
        assert_eq!(py_str("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_templates_compile() {
        assert!(environment().is_ok());
    }
}
