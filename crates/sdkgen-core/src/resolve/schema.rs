use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

/// A schema with every `$ref` expanded, or replaced by an explicit marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    /// Component name, when this node is `#/components/schemas/<name>`.
    pub name: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String { format: Option<String> },
    Integer,
    Number,
    Boolean,
    Null,
    Any,
    Array(Arc<ResolvedSchema>),
    Object {
        properties: IndexMap<String, Arc<ResolvedSchema>>,
        required: Vec<String>,
        additional: Option<Arc<ResolvedSchema>>,
    },
    /// Object with no declared properties and typed `additionalProperties`.
    Map(Arc<ResolvedSchema>),
    Enum(Vec<serde_json::Value>),
    /// `oneOf` / `anyOf`, or a multi-valued `type`.
    Union(Vec<Arc<ResolvedSchema>>),
    /// `allOf`.
    Intersection(Vec<Arc<ResolvedSchema>>),
    /// A component that was not expanded at this position.
    Reference { target: String, kind: ReferenceKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// The target was already on the resolution path.
    Cycle,
    /// Expansion stopped at the configured depth.
    DepthLimit,
}

impl ResolvedSchema {
    pub fn anonymous(kind: SchemaKind) -> Self {
        Self {
            name: None,
            description: None,
            nullable: false,
            kind,
        }
    }

    pub fn reference(target: impl Into<String>, kind: ReferenceKind) -> Self {
        Self::anonymous(SchemaKind::Reference {
            target: target.into(),
            kind,
        })
    }

    /// The component this node stands for, whether expanded or a marker.
    pub fn component(&self) -> Option<&str> {
        match (&self.name, &self.kind) {
            (Some(name), _) => Some(name),
            (None, SchemaKind::Reference { target, .. }) => Some(target),
            _ => None,
        }
    }

    /// Named shapes compare by component name, anonymous ones structurally.
    pub fn same_shape(&self, other: &ResolvedSchema) -> bool {
        match (self.component(), other.component()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// Component names reachable from this node (itself included), first seen first.
    pub fn dependencies(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_dependencies(&mut seen, &mut out);
        out
    }

    fn collect_dependencies(&self, seen: &mut HashSet<String>, out: &mut Vec<String>) {
        if let Some(name) = self.component() {
            if !seen.insert(name.to_string()) {
                return;
            }
            out.push(name.to_string());
        }
        for child in self.children() {
            child.collect_dependencies(seen, out);
        }
    }

    fn children(&self) -> Vec<&Arc<ResolvedSchema>> {
        match &self.kind {
            SchemaKind::Array(item) | SchemaKind::Map(item) => vec![item],
            SchemaKind::Object {
                properties,
                additional,
                ..
            } => properties.values().chain(additional.iter()).collect(),
            SchemaKind::Union(members) | SchemaKind::Intersection(members) => {
                members.iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Whether this node is a marker that the emitter must forward-declare.
    pub fn is_back_reference(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::Reference {
                kind: ReferenceKind::Cycle,
                ..
            }
        )
    }
}
