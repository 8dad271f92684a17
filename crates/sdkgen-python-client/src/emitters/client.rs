use minijinja::context;
use serde::Serialize;
use sdkgen_core::GeneratedFile;
use sdkgen_core::error::{GeneratorError, TransformError};
use sdkgen_core::ir::{
    ConstructorParam, ConstructorSource, Grouping, GroupingMode, IrOperation, IrSpec,
    NameBinding, OperationGroup,
};

use super::{MethodContext, doc_lines, environment, model_imports, py_str, render};
use crate::generator::EmitOptions;
use crate::type_mapper::TypeMapper;

#[derive(Debug, Serialize)]
struct ConstructorContext {
    name: String,
    /// Python literal.
    header: String,
    required: bool,
    /// Python literal, for token schemes.
    prefix: Option<String>,
    auth: bool,
    doc: String,
}

impl ConstructorContext {
    fn new(param: &ConstructorParam) -> Self {
        let auth = matches!(param.source, ConstructorSource::Scheme(_));
        let doc = param
            .description
            .as_deref()
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| {
                if auth {
                    format!("Credential sent as the `{}` header.", param.header)
                } else {
                    format!("Sent as the `{}` header on every request.", param.header)
                }
            });
        Self {
            name: param.name.member_name.clone(),
            header: py_str(&param.header),
            required: param.required,
            prefix: param.prefix.as_deref().map(py_str),
            auth,
            doc: super::escape_docstring(doc),
        }
    }
}

/// A tag class exposed as an attribute of the root client.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TagUnit {
    pub attribute: String,
    pub module: String,
    /// Module alias inside `client.py`.
    pub alias: String,
    pub class_name: String,
}

impl TagUnit {
    fn new(group: &OperationGroup) -> Self {
        Self {
            attribute: group.name.member_name.clone(),
            module: group.name.member_name.clone(),
            alias: format!("_{}_tag", group.name.member_name),
            class_name: format!("{}Client", group.name.type_name),
        }
    }
}

/// Public members of the root class that tag attributes and flat methods must not shadow.
const ROOT_MEMBERS: &[&str] = &["close"];

/// Tag classes must not share the root class name, and neither tag attributes
/// nor flat methods may reuse a root member.
fn check_root_names(ir: &IrSpec, grouping: &Grouping) -> Result<(), TransformError> {
    fn collision(scope: &str, first: &str, second: &NameBinding, identifier: &str) -> TransformError {
        TransformError::NameCollision {
            scope: scope.to_string(),
            first: first.to_string(),
            second: second.original.clone(),
            identifier: identifier.to_string(),
        }
    }
    match grouping.mode {
        GroupingMode::TagPartitioned => {
            for group in &grouping.groups {
                if group.name.type_name == grouping.root.type_name {
                    return Err(collision(
                        "tags",
                        grouping.root.original.as_str(),
                        &group.name,
                        root_class(grouping).as_str(),
                    ));
                }
                if let Some(member) = ROOT_MEMBERS
                    .iter()
                    .find(|m| **m == group.name.member_name)
                {
                    return Err(collision("tags", *member, &group.name, *member));
                }
            }
        }
        GroupingMode::Flat => {
            for op in &ir.operations {
                if let Some(member) = ROOT_MEMBERS.iter().find(|m| **m == op.name.member_name) {
                    return Err(collision("operations", *member, &op.name, *member));
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn root_class(grouping: &Grouping) -> String {
    format!("{}Client", grouping.root.type_name)
}

pub(crate) fn tag_units(grouping: &Grouping) -> Vec<TagUnit> {
    match grouping.mode {
        GroupingMode::Flat => Vec::new(),
        GroupingMode::TagPartitioned => grouping.groups.iter().map(TagUnit::new).collect(),
    }
}

fn group_ops<'a>(ir: &'a IrSpec, group: &'a OperationGroup) -> impl Iterator<Item = &'a IrOperation> {
    group.operations.iter().filter_map(|&i| ir.operations.get(i))
}

/// Emit the package: `client.py`, `__init__.py`, and in partitioned mode one
/// module per tag under `tags/`.
pub fn emit_client(
    ir: &IrSpec,
    grouping: &Grouping,
    options: &EmitOptions,
    package: &str,
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    check_root_names(ir, grouping)?;
    let env = environment()?;
    let mapper = TypeMapper::new(ir);
    let class_name = root_class(grouping);
    let units = tag_units(grouping);

    let flat_ops: Vec<&IrOperation> = match grouping.mode {
        GroupingMode::Flat => grouping
            .groups
            .iter()
            .flat_map(|g| group_ops(ir, g))
            .collect(),
        GroupingMode::TagPartitioned => Vec::new(),
    };
    let methods: Vec<MethodContext> = flat_ops
        .iter()
        .map(|op| MethodContext::build(op, &mapper, options.docstrings))
        .collect();

    let base_url = options
        .base_url
        .as_deref()
        .or_else(|| ir.servers.first().map(|s| s.url.as_str()))
        .map(py_str);
    let constructor: Vec<ConstructorContext> =
        grouping.constructor.iter().map(ConstructorContext::new).collect();
    let doc = if options.docstrings {
        let mut lines = doc_lines(Some(&ir.info.title.original));
        let description = doc_lines(ir.info.description.as_deref());
        if !description.is_empty() {
            lines.push(String::new());
            lines.extend(description);
        }
        lines
    } else {
        Vec::new()
    };

    let client = render(
        &env,
        "client.py.j2",
        context! {
            class_name => &class_name,
            doc => doc,
            docstrings => options.docstrings,
            base_url => base_url,
            timeout => format!("{:?}", options.timeout),
            constructor => constructor,
            tag_units => &units,
            methods => methods,
            receiver => "self",
            models_module => &options.models_module,
            model_imports => model_imports(flat_ops.iter().copied(), &mapper),
        },
    )?;

    let mut files = vec![
        GeneratedFile::new(format!("{package}/client.py"), client),
        GeneratedFile::new(
            format!("{package}/__init__.py"),
            render(&env, "package_init.py.j2", context! { class_name => &class_name })?,
        ),
    ];

    if grouping.mode == GroupingMode::TagPartitioned {
        for (group, unit) in grouping.groups.iter().zip(&units) {
            let ops: Vec<&IrOperation> = group_ops(ir, group).collect();
            let methods: Vec<MethodContext> = ops
                .iter()
                .map(|op| MethodContext::build(op, &mapper, options.docstrings))
                .collect();
            let doc = if options.docstrings {
                doc_lines(group.description.as_deref())
            } else {
                Vec::new()
            };
            let content = render(
                &env,
                "tag.py.j2",
                context! {
                    class_name => &unit.class_name,
                    root_class => &class_name,
                    doc => doc,
                    methods => methods,
                    receiver => "self._client",
                    models_module => &options.models_module,
                    model_imports => model_imports(ops.iter().copied(), &mapper),
                },
            )?;
            files.push(GeneratedFile::new(
                format!("{package}/tags/{}.py", unit.module),
                content,
            ));
        }
        files.push(GeneratedFile::new(
            format!("{package}/tags/__init__.py"),
            render(&env, "tags_init.py.j2", context! { tag_units => &units })?,
        ));
    }

    Ok(files)
}
