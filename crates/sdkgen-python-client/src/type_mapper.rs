use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use sdkgen_core::ir::IrSpec;
use sdkgen_core::resolve::{ResolvedSchema, SchemaKind};

/// Where a rendered type is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMode {
    /// Signature and return annotations. Back-references are quoted.
    Annotation,
    /// Expressions evaluated at runtime, e.g. the status → type map.
    Runtime,
}

/// Class name datamodel-codegen gives a schema component.
///
/// Each segment between separators gets an upper-case first letter and keeps
/// the rest of its case: `LLMOptions` stays `LLMOptions`, `chunk_group`
/// becomes `ChunkGroup`.
pub fn model_class_name(component: &str) -> String {
    let mut class: String = component
        .split(|c: char| !c.is_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect();
    if class.is_empty() {
        class.push_str("Model");
    } else if class.starts_with(|c: char| c.is_ascii_digit()) {
        class.insert(0, '_');
    }
    class
}

/// Maps resolved schemas to Python type expressions, naming components the
/// way the emitted models module does.
pub struct TypeMapper<'a> {
    classes: IndexMap<&'a str, String>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(ir: &'a IrSpec) -> Self {
        Self {
            classes: ir
                .schemas
                .keys()
                .map(|component| (component.as_str(), model_class_name(component)))
                .collect(),
        }
    }

    pub fn annotation(&self, shape: &ResolvedSchema) -> String {
        self.render(shape, TypeMode::Annotation)
    }

    pub fn runtime(&self, shape: &ResolvedSchema) -> String {
        self.render(shape, TypeMode::Runtime)
    }

    /// Class name of a schema component in the models module.
    pub fn class_name(&self, component: &str) -> String {
        self.classes
            .get(component)
            .cloned()
            .unwrap_or_else(|| model_class_name(component))
    }

    pub fn render(&self, shape: &ResolvedSchema, mode: TypeMode) -> String {
        let base = match (&shape.name, &shape.kind) {
            (_, SchemaKind::Reference { target, .. }) => {
                let class = self.class_name(target);
                match mode {
                    TypeMode::Annotation => format!("\"{class}\""),
                    TypeMode::Runtime => class,
                }
            }
            (Some(name), _) => self.class_name(name),
            (None, kind) => self.render_kind(kind, mode),
        };
        if shape.nullable && base != "None" && base != "Any" && !base.ends_with(" | None") {
            format!("{base} | None")
        } else {
            base
        }
    }

    fn render_kind(&self, kind: &SchemaKind, mode: TypeMode) -> String {
        match kind {
            SchemaKind::String { format } if format.as_deref() == Some("binary") => {
                "bytes".to_string()
            }
            SchemaKind::String { .. } => "str".to_string(),
            SchemaKind::Integer => "int".to_string(),
            SchemaKind::Number => "float".to_string(),
            SchemaKind::Boolean => "bool".to_string(),
            SchemaKind::Null => "None".to_string(),
            SchemaKind::Any => "Any".to_string(),
            SchemaKind::Array(item) => format!("list[{}]", self.render(item, mode)),
            SchemaKind::Map(value) => format!("dict[str, {}]", self.render(value, mode)),
            SchemaKind::Object { .. } => "dict[str, Any]".to_string(),
            SchemaKind::Enum(values) => literal(values).unwrap_or_else(|| "Any".to_string()),
            SchemaKind::Union(members) => {
                let mut rendered: Vec<String> = Vec::new();
                for member in members {
                    let r = self.render(member, mode);
                    for part in r.split(" | ") {
                        if !rendered.iter().any(|seen| seen == part) {
                            rendered.push(part.to_string());
                        }
                    }
                }
                if rendered.is_empty() || rendered.iter().any(|r| r == "Any") {
                    "Any".to_string()
                } else {
                    rendered.join(" | ")
                }
            }
            SchemaKind::Intersection(parts) => match parts.as_slice() {
                [only] => self.render(only, mode),
                _ => "dict[str, Any]".to_string(),
            },
            SchemaKind::Reference { target, .. } => self.class_name(target),
        }
    }

    /// Model classes a shape mentions at its top level, i.e. the names its
    /// rendered expression needs in scope.
    pub fn referenced_models(&self, shape: &ResolvedSchema, out: &mut BTreeSet<String>) {
        if let SchemaKind::Reference { target, .. } = &shape.kind {
            out.insert(self.class_name(target));
            return;
        }
        if let Some(name) = &shape.name {
            out.insert(self.class_name(name));
            return;
        }
        match &shape.kind {
            SchemaKind::Array(inner) | SchemaKind::Map(inner) => {
                self.referenced_models(inner, out)
            }
            SchemaKind::Union(members) => {
                for member in members {
                    self.referenced_models(member, out);
                }
            }
            SchemaKind::Intersection(parts) if parts.len() == 1 => {
                self.referenced_models(&parts[0], out)
            }
            _ => {}
        }
    }
}

/// `Literal[...]` over enum values when every value is a Python literal.
fn literal(values: &[Value]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let rendered = values
        .iter()
        .map(|v| match v {
            // JSON string escapes are valid Python string escapes.
            Value::String(_) => Some(v.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(format!("Literal[{}]", rendered.join(", ")))
}
