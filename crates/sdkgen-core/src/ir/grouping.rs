use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use super::operations::IrParameter;
use super::types::{IrSpec, NameBinding};

/// Structural mode for emitted client classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// Every operation is a method of the root client.
    Flat,
    /// One class per tag, each an attribute of a thin root facade.
    TagPartitioned,
}

impl GroupingMode {
    pub fn from_flag(tag_partitioned: bool) -> Self {
        if tag_partitioned {
            GroupingMode::TagPartitioned
        } else {
            GroupingMode::Flat
        }
    }
}

/// Operations that share one emitted class.
#[derive(Debug, Clone)]
pub struct OperationGroup {
    pub name: NameBinding,
    pub description: Option<String>,
    /// Indices into `IrSpec.operations`, in document order.
    pub operations: Vec<usize>,
}

/// Where a constructor argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorSource {
    /// A declared security scheme, by key.
    Scheme(String),
    /// A header parameter repeated across operations.
    Header,
}

/// A value supplied once to the root client and sent as a header on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorParam {
    pub header: String,
    pub name: NameBinding,
    pub required: bool,
    pub description: Option<String>,
    pub prefix: Option<String>,
    pub source: ConstructorSource,
}

/// The class/file partition the emitter renders.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub mode: GroupingMode,
    /// Root client name, from the API title.
    pub root: NameBinding,
    pub groups: Vec<OperationGroup>,
    /// Union of auth schemes and constructor-level headers over all operations.
    pub constructor: Vec<ConstructorParam>,
}

impl Grouping {
    /// The group holding operation `index`.
    pub fn group_of(&self, index: usize) -> Option<&OperationGroup> {
        self.groups.iter().find(|g| g.operations.contains(&index))
    }

    /// Caller-side access path, e.g. `client.chunk_group.create_chunk_group`.
    pub fn attribute_path(&self, ir: &IrSpec, index: usize) -> Option<String> {
        let op = ir.operations.get(index)?;
        match self.mode {
            GroupingMode::Flat => Some(format!("client.{}", op.name.member_name)),
            GroupingMode::TagPartitioned => {
                let group = self.group_of(index)?;
                Some(format!(
                    "client.{}.{}",
                    group.name.member_name, op.name.member_name
                ))
            }
        }
    }
}

/// Partition operations into emitted classes.
///
/// Tag groups are ordered by first appearance while scanning operations in
/// document order, so an unchanged document always yields the same layout.
pub fn group_operations(ir: &IrSpec, mode: GroupingMode) -> Grouping {
    let groups = match mode {
        GroupingMode::Flat => vec![OperationGroup {
            name: ir.info.title.clone(),
            description: ir.info.description.clone(),
            operations: (0..ir.operations.len()).collect(),
        }],
        GroupingMode::TagPartitioned => group_by_tag(ir),
    };
    debug!(
        "grouped {} operations into {} {:?} group(s)",
        ir.operations.len(),
        groups.len(),
        mode
    );

    Grouping {
        mode,
        root: ir.info.title.clone(),
        groups,
        constructor: constructor_union(ir),
    }
}

fn group_by_tag(ir: &IrSpec) -> Vec<OperationGroup> {
    let mut buckets: IndexMap<&str, OperationGroup> = IndexMap::new();
    for (i, op) in ir.operations.iter().enumerate() {
        buckets
            .entry(op.tag.original.as_str())
            .or_insert_with(|| OperationGroup {
                name: op.tag.clone(),
                description: ir.tag_descriptions.get(&op.tag.original).cloned(),
                operations: Vec::new(),
            })
            .operations
            .push(i);
    }
    buckets.into_values().collect()
}

/// Auth schemes first, then constructor-level headers in first-seen order.
/// Headers compare case-insensitively; a header already carried by a scheme is not repeated.
fn constructor_union(ir: &IrSpec) -> Vec<ConstructorParam> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut params: Vec<ConstructorParam> = Vec::new();

    for scheme in &ir.auth_schemes {
        if seen.insert(scheme.header.to_ascii_lowercase()) {
            params.push(ConstructorParam {
                header: scheme.header.clone(),
                name: scheme.binding.clone(),
                required: scheme.required,
                description: scheme.description.clone(),
                prefix: scheme.prefix.clone(),
                source: ConstructorSource::Scheme(scheme.scheme.clone()),
            });
        }
    }

    let headers: Vec<&IrParameter> = ir
        .operations
        .iter()
        .flat_map(|op| op.constructor_headers())
        .collect();
    for header in &headers {
        let key = header.original_name.to_ascii_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        // Required only if every declaration of the header requires it.
        let required = headers
            .iter()
            .filter(|h| h.original_name.eq_ignore_ascii_case(&key))
            .all(|h| h.required);
        params.push(ConstructorParam {
            header: header.original_name.clone(),
            name: header.name.clone(),
            required,
            description: header.description.clone(),
            prefix: None,
            source: ConstructorSource::Header,
        });
    }
    params
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ir::{
        HeaderScope, HttpMethod, IrInfo, IrOperation, ParameterRole, ReturnType,
    };
    use crate::resolve::{ResolvedSchema, SchemaKind};
    use crate::transform::name_normalizer::normalize;

    fn header(name: &str, required: bool) -> IrParameter {
        IrParameter {
            name: normalize(name),
            original_name: name.to_string(),
            role: ParameterRole::Header,
            required,
            shape: Arc::new(ResolvedSchema::anonymous(SchemaKind::String { format: None })),
            description: None,
            header_scope: HeaderScope::Constructor,
        }
    }

    fn op(id: &str, tag: &str, parameters: Vec<IrParameter>) -> IrOperation {
        IrOperation {
            id: id.to_string(),
            name: normalize(id),
            tag: normalize(tag),
            method: HttpMethod::Get,
            path: format!("/{id}"),
            summary: None,
            description: None,
            deprecated: false,
            parameters,
            request_body: None,
            responses: Vec::new(),
            return_type: ReturnType::NoContent,
            skip_auth: false,
        }
    }

    fn ir(operations: Vec<IrOperation>) -> IrSpec {
        IrSpec {
            info: IrInfo {
                title: normalize("Trieve API"),
                description: None,
                version: "1".to_string(),
            },
            servers: Vec::new(),
            operations,
            schemas: IndexMap::new(),
            auth_schemes: Vec::new(),
            tag_descriptions: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_tag_order_is_first_encounter() {
        let ir = ir(vec![
            op("updateGroup", "Chunk Group", vec![]),
            op("createChunk", "Chunk", vec![]),
            op("createGroup", "Chunk Group", vec![]),
            op("getChunk", "Chunk", vec![]),
        ]);
        let grouping = group_operations(&ir, GroupingMode::TagPartitioned);
        let names: Vec<_> = grouping
            .groups
            .iter()
            .map(|g| (g.name.member_name.as_str(), g.operations.clone()))
            .collect();
        assert_eq!(
            names,
            vec![("chunk_group", vec![0, 2]), ("chunk", vec![1, 3])]
        );
        assert_eq!(
            grouping.attribute_path(&ir, 2).as_deref(),
            Some("client.chunk_group.create_group")
        );
    }

    #[test]
    fn test_flat_single_group() {
        let ir = ir(vec![op("a", "X", vec![]), op("b", "Y", vec![])]);
        let grouping = group_operations(&ir, GroupingMode::Flat);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].operations, vec![0, 1]);
        assert_eq!(grouping.root.type_name, "TrieveApi");
        assert_eq!(grouping.attribute_path(&ir, 1).as_deref(), Some("client.b"));
    }

    #[test]
    fn test_constructor_union_dedupes_case_insensitively() {
        let ir = ir(vec![
            op("a", "X", vec![header("TR-Dataset", true)]),
            op("b", "Y", vec![header("tr-dataset", false), header("TR-Organization", true)]),
        ]);
        let grouping = group_operations(&ir, GroupingMode::TagPartitioned);
        let headers: Vec<_> = grouping
            .constructor
            .iter()
            .map(|c| (c.header.as_str(), c.required))
            .collect();
        assert_eq!(
            headers,
            vec![("TR-Dataset", false), ("TR-Organization", true)]
        );
    }
}
