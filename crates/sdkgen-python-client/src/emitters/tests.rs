use minijinja::context;
use sdkgen_core::GeneratedFile;
use sdkgen_core::error::GeneratorError;
use sdkgen_core::ir::{Grouping, GroupingMode, IrSpec};

use super::client::{root_class, tag_units};
use super::{environment, render};

/// Emit `tests/conftest.py` and one structural `tests/test_<unit>.py` per
/// output unit (the root client, plus each tag class when partitioned).
pub fn emit_tests(
    ir: &IrSpec,
    grouping: &Grouping,
    package: &str,
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let env = environment()?;
    let root = root_class(grouping);
    let required: Vec<&str> = grouping
        .constructor
        .iter()
        .filter(|c| c.required)
        .map(|c| c.name.member_name.as_str())
        .collect();
    let method_names = |indices: &[usize]| -> Vec<String> {
        indices
            .iter()
            .filter_map(|&i| ir.operations.get(i))
            .map(|op| op.name.member_name.clone())
            .collect()
    };

    let mut files = vec![GeneratedFile::new(
        "tests/conftest.py",
        render(
            &env,
            "conftest.py.j2",
            context! { package => package, root_class => &root, required => &required },
        )?,
    )];

    let root_methods: Vec<String> = match grouping.mode {
        GroupingMode::Flat => grouping
            .groups
            .iter()
            .flat_map(|g| method_names(&g.operations))
            .collect(),
        GroupingMode::TagPartitioned => Vec::new(),
    };
    files.push(GeneratedFile::new(
        "tests/test_client.py",
        render(
            &env,
            "test_unit.py.j2",
            context! {
                package => package,
                root_class => &root,
                unit => "client",
                access => "client",
                methods => root_methods,
                required => &required,
                root => true,
            },
        )?,
    ));

    for (group, unit) in grouping.groups.iter().zip(tag_units(grouping)) {
        let file_name = if unit.module == "client" {
            "test_client_tag.py".to_string()
        } else {
            format!("test_{}.py", unit.module)
        };
        files.push(GeneratedFile::new(
            format!("tests/{file_name}"),
            render(
                &env,
                "test_unit.py.j2",
                context! {
                    package => package,
                    root_class => &root,
                    unit => &unit.module,
                    access => format!("client.{}", unit.attribute),
                    methods => method_names(&group.operations),
                    required => &required,
                    root => false,
                },
            )?,
        ));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_core::ir::group_operations;
    use sdkgen_core::parse;
    use sdkgen_core::transform;

    const SPEC: &str = r#"
openapi: 3.0.3
info: {title: Notes, version: '1'}
components:
  securitySchemes:
    Token: {type: http, scheme: bearer}
security:
  - Token: []
paths:
  /notes:
    get:
      operationId: listNotes
      tags: [notes]
      responses: {'200': {description: OK}}
  /users:
    get:
      operationId: listUsers
      tags: [users]
      responses: {'200': {description: OK}}
"#;

    #[test]
    fn test_one_file_per_unit() {
        let spec = parse::from_yaml(SPEC).unwrap();
        let ir = transform::transform(&spec).unwrap();
        let grouping = group_operations(&ir, GroupingMode::TagPartitioned);
        let files = emit_tests(&ir, &grouping, "notes").unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "tests/conftest.py",
                "tests/test_client.py",
                "tests/test_notes.py",
                "tests/test_users.py",
            ]
        );
        assert!(files[0].content.contains("        token=\"test\",\n"));
        assert!(files[1].content.contains("def test_hooks_wrap_each_request()"));
        assert!(files[2].content.contains("assert callable(getattr(client.notes, \"list_notes\", None))"));
        assert!(!files[2].content.contains("test_hooks_wrap_each_request"));
    }

    #[test]
    fn test_flat_methods_on_root() {
        let spec = parse::from_yaml(SPEC).unwrap();
        let ir = transform::transform(&spec).unwrap();
        let grouping = group_operations(&ir, GroupingMode::Flat);
        let files = emit_tests(&ir, &grouping, "notes").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].content.contains("def test_list_users_is_exposed("));
    }
}
