use std::sync::Arc;

use sdkgen_core::error::{ResolveError, Stage, TransformError};
use sdkgen_core::ir::{Diagnostic, ResponseShape};
use sdkgen_core::parse;
use sdkgen_core::resolve::{ReferenceKind, ResolutionContext, SchemaKind};
use sdkgen_core::transform;

const CYCLIC: &str = include_str!("fixtures/cyclic.yaml");
const CHUNKS: &str = include_str!("fixtures/chunks.yaml");

#[test]
fn self_referencing_schema_terminates() {
    let spec = parse::from_yaml(CYCLIC).unwrap();
    let mut ctx = ResolutionContext::new(&spec, 32);
    let node = ctx.resolve_ref("#/components/schemas/Node").unwrap();

    let SchemaKind::Object { properties, required, .. } = &node.kind else {
        panic!("Node should be an object");
    };
    assert_eq!(required, &vec!["value".to_string()]);

    let parent = &properties["parent"];
    assert!(parent.is_back_reference());
    assert!(matches!(
        &parent.kind,
        SchemaKind::Reference { target, kind: ReferenceKind::Cycle } if target == "Node"
    ));

    let SchemaKind::Array(child) = &properties["children"].kind else {
        panic!("children should be an array");
    };
    assert_eq!(child.component(), Some("Node"));

    // Both back-references belong to the same cycle.
    assert_eq!(ctx.cycles().len(), 1);
    assert_eq!(ctx.cycles()[0].chain, vec!["Node", "Node"]);
}

#[test]
fn cycles_are_reported_not_fatal() {
    let spec = parse::from_yaml(CYCLIC).unwrap();
    let ir = transform::transform(&spec).unwrap();
    assert_eq!(
        ir.diagnostics,
        vec![Diagnostic::CyclicReference {
            chain: vec!["Node".to_string(), "Node".to_string()]
        }]
    );
    insta::assert_snapshot!(
        ir.diagnostics[0],
        @"cyclic reference Node → Node (emitted as a forward reference)"
    );

    let create = &ir.operations[0];
    let body = create.request_body.as_ref().unwrap();
    assert_eq!(body.dependencies, vec!["Node"]);
    let ResponseShape::Content(returned) = &create.responses[0].shape else {
        panic!("expected content");
    };
    assert!(Arc::ptr_eq(returned, &body.shape));
}

#[test]
fn mutual_cycle_records_chain() {
    let yaml = r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths: {}
components:
  schemas:
    Author:
      type: object
      properties:
        books: {type: array, items: {$ref: '#/components/schemas/Book'}}
    Book:
      type: object
      properties:
        author: {$ref: '#/components/schemas/Author'}
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let mut ctx = ResolutionContext::new(&spec, 32);
    let author = ctx.resolve_named("Author").unwrap();
    assert_eq!(author.dependencies(), vec!["Author", "Book"]);
    assert_eq!(ctx.cycles()[0].to_string(), "Author → Book → Author");

    // Book was cached while Author was still open.
    let book = ctx.resolve_named("Book").unwrap();
    let SchemaKind::Object { properties, .. } = &book.kind else {
        panic!("Book should be an object");
    };
    assert!(properties["author"].is_back_reference());
}

#[test]
fn external_reference_is_rejected() {
    let yaml = r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths:
  /a:
    get:
      operationId: a
      tags: [x]
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema: {$ref: 'shared.yaml#/components/schemas/Pet'}
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let err = transform::transform(&spec).unwrap_err();
    assert_eq!(err.stage(), Stage::Resolve);
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::UnsupportedReference(ref r))
            if r == "shared.yaml#/components/schemas/Pet"
    ));
    assert!(err.to_string().contains("shared.yaml#/components/schemas/Pet"));
}

#[test]
fn dangling_reference_is_rejected() {
    let yaml = r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths: {}
components:
  schemas:
    Pet:
      type: object
      properties:
        owner: {$ref: '#/components/schemas/Owner'}
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let err = transform::transform(&spec).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::Unresolvable(ref r)) if r == "#/components/schemas/Owner"
    ));
}

#[test]
fn escaped_and_plain_refs_share_instance() {
    let spec = parse::from_yaml(CHUNKS).unwrap();
    let mut ctx = ResolutionContext::new(&spec, 32);
    let plain = ctx.resolve_ref("#/components/schemas/ChunkGroup").unwrap();
    let encoded = ctx
        .resolve_ref("#/components/schemas/Chunk%47roup")
        .unwrap();
    assert!(Arc::ptr_eq(&plain, &encoded));
}

#[test]
fn parameter_ref_to_wrong_section_is_invalid() {
    let yaml = r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths:
  /a:
    get:
      operationId: a
      tags: [x]
      parameters:
        - $ref: '#/components/schemas/Pet'
      responses: {}
components:
  schemas:
    Pet: {type: object}
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let err = transform::transform(&spec).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::InvalidReference { ref expected, .. })
            if expected == "parameters"
    ));
}
