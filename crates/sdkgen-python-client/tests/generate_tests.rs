use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use sdkgen_core::config::SdkgenConfig;
use sdkgen_core::error::{GeneratorError, Stage};
use sdkgen_core::ir::{GroupingMode, group_operations};
use sdkgen_core::transform::{TransformOptions, transform_with_options};
use sdkgen_core::{CodeGenerator, GeneratedFile, parse};
use sdkgen_python_client::{
    EmitOptions, ModelCompiler, ModelsOutcome, PYTHON_RESERVED, PythonClientGenerator, pipeline,
};

const CHUNKS: &str = include_str!("fixtures/chunks.yaml");
const CYCLIC: &str = include_str!("fixtures/cyclic.yaml");

fn emit(yaml: &str, mode: GroupingMode, options: EmitOptions) -> Vec<GeneratedFile> {
    let spec = parse::from_yaml(yaml).unwrap();
    let transform_options =
        TransformOptions::default().with_reserved_words(PYTHON_RESERVED.iter().copied());
    let ir = transform_with_options(&spec, &transform_options).unwrap();
    let grouping = group_operations(&ir, mode);
    PythonClientGenerator::new(options)
        .generate(&ir, &grouping)
        .unwrap()
}

fn content<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
    match files.iter().find(|f| f.path == path) {
        Some(f) => &f.content,
        None => panic!("{path} not generated"),
    }
}

#[test]
fn partitioned_chunks_layout() {
    let files = emit(CHUNKS, GroupingMode::TagPartitioned, EmitOptions::default());
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "trieve_api/client.py",
            "trieve_api/__init__.py",
            "trieve_api/tags/chunk.py",
            "trieve_api/tags/chunk_group.py",
            "trieve_api/tags/default.py",
            "trieve_api/tags/__init__.py",
            "requirements.txt",
        ]
    );

    let client = content(&files, "trieve_api/client.py");
    assert!(client.contains("class TrieveApiClient:"));
    assert!(client.contains("        base_url: str = \"https://api.trieve.ai/api\",\n        *,\n        tr_dataset: str,\n"));
    assert!(client.contains("            self._default_headers[\"TR-Dataset\"] = tr_dataset\n"));
    assert!(client.contains("        self.chunk = _chunk_tag.ChunkClient(self)\n        self.chunk_group = _chunk_group_tag.ChunkGroupClient(self)\n        self.default = _default_tag.DefaultClient(self)\n"));
    assert!(client.contains("before_request: Callable[[httpx.Request], None] | None = None"));
}

#[test]
fn signature_is_required_first_and_skips_constructor_headers() {
    let files = emit(CHUNKS, GroupingMode::TagPartitioned, EmitOptions::default());
    let chunk = content(&files, "trieve_api/tags/chunk.py");

    assert!(chunk.contains(
        "    def get_chunk_by_id(
        self,
        chunk_id: str,
        highlight: str,
        x_api_version: str | None = None,
        include_vectors: bool | None = None,
    ) -> ChunkMetadata:"
    ));
    assert!(chunk.contains("        _path = f\"/chunk/{chunk_id}\"\n"));
    assert!(chunk.contains("            _params[\"include_vectors\"] = self._client._to_jsonable(include_vectors)\n"));
    assert!(chunk.contains("            _headers[\"X-API-Version\"] = str(x_api_version)\n"));
    assert!(!chunk.contains("tr_dataset"));
    assert!(!chunk.contains("session"));
}

#[test]
fn multi_status_returns_union_with_table() {
    let files = emit(CHUNKS, GroupingMode::TagPartitioned, EmitOptions::default());
    let chunk = content(&files, "trieve_api/tags/chunk.py");

    assert!(chunk.contains("        request_body: CreateChunkReqPayload,\n    ) -> ChunkMetadata | ErrorResponseBody:"));
    assert!(chunk.contains("        Returns:\n            200 → ChunkMetadata\n            400 → ErrorResponseBody\n"));
    assert!(chunk.contains("            json=self._client._to_jsonable(request_body),\n"));
    assert!(chunk.contains("                200: ChunkMetadata,\n                400: ErrorResponseBody,\n"));
    assert!(chunk.contains("from models.models import (\n    ChunkMetadata,\n    CreateChunkReqPayload,\n    ErrorResponseBody,\n)"));
}

#[test]
fn empty_security_skips_auth_headers() {
    let files = emit(CHUNKS, GroupingMode::TagPartitioned, EmitOptions::default());
    let chunk = content(&files, "trieve_api/tags/chunk.py");
    let delete = &chunk[chunk.find("def delete_chunk(").unwrap()..];
    assert!(delete.contains("    ) -> None:"));
    assert!(delete.contains("            skip_auth=True,\n"));
}

#[test]
fn text_responses_parse_as_str() {
    let files = emit(CHUNKS, GroupingMode::TagPartitioned, EmitOptions::default());
    let default = content(&files, "trieve_api/tags/default.py");
    assert!(default.contains("    def list_health(\n        self,\n    ) -> str:"));
    assert!(default.contains("                200: str,\n"));
}

#[test]
fn flat_mode_puts_methods_on_root() {
    let files = emit(CHUNKS, GroupingMode::Flat, EmitOptions::default());
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["trieve_api/client.py", "trieve_api/__init__.py", "requirements.txt"]
    );
    let client = content(&files, "trieve_api/client.py");
    for method in [
        "create_chunk",
        "get_chunk_by_id",
        "delete_chunk",
        "create_chunk_group",
        "list_health",
    ] {
        assert!(client.contains(&format!("    def {method}(\n")), "{method}");
    }
    assert!(client.contains("_response = self._make_request("));
}

#[test]
fn docstrings_escape_and_can_be_disabled() {
    let yaml = r#"
openapi: 3.0.3
info: {title: Quotes, version: '1'}
paths:
  /q:
    get:
      operationId: getQuote
      tags: [q]
      summary: 'Returns """text""" from C:\quotes'
      parameters:
        - name: from
          in: query
          description: Start offset
          schema: {type: integer}
      responses:
        '200': {description: OK}
"#;
    let files = emit(yaml, GroupingMode::Flat, EmitOptions::default());
    let client = content(&files, "quotes/client.py");
    assert!(client.contains(r#"        Returns \"\"\"text\"\"\" from C:\\quotes"#));
    assert!(client.contains("        from_: int | None = None,\n"));
    assert!(client.contains("            from_: Start offset\n"));
    assert!(client.contains("            _params[\"from\"] = self._to_jsonable(from_)\n"));

    let options = EmitOptions {
        docstrings: false,
        ..EmitOptions::default()
    };
    let files = emit(yaml, GroupingMode::Flat, options);
    assert!(!content(&files, "quotes/client.py").contains("Returns:"));
}

#[test]
fn cyclic_document_generates() {
    let files = emit(CYCLIC, GroupingMode::TagPartitioned, EmitOptions::default());
    let nodes = content(&files, "tree_service/tags/nodes.py");
    assert!(nodes.contains("        request_body: Node,\n    ) -> Node:"));
    assert!(nodes.contains("    ) -> Forest:"));
}

#[test]
fn acronym_components_keep_their_class_names() {
    let yaml = r#"
openapi: 3.0.3
info: {title: Trieve API, version: '1'}
paths:
  /llm:
    post:
      operationId: configureLlm
      tags: [llm]
      requestBody:
        required: true
        content:
          application/json:
            schema: {$ref: '#/components/schemas/LLMOptions'}
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema: {$ref: '#/components/schemas/APIVersion'}
components:
  schemas:
    LLMOptions:
      type: object
      properties:
        temperature: {type: number}
    APIVersion:
      type: string
      enum: [V1, V2]
"#;
    let files = emit(yaml, GroupingMode::TagPartitioned, EmitOptions::default());
    let llm = content(&files, "trieve_api/tags/llm.py");
    assert!(llm.contains("from models.models import (\n    APIVersion,\n    LLMOptions,\n)"));
    assert!(llm.contains("        request_body: LLMOptions,\n    ) -> APIVersion:"));
    assert!(llm.contains("                200: APIVersion,\n"));
    assert!(!llm.contains("Llmoptions"));
}

#[test]
fn regeneration_is_byte_identical() {
    for mode in [GroupingMode::Flat, GroupingMode::TagPartitioned] {
        let options = EmitOptions {
            include_tests: true,
            ..EmitOptions::default()
        };
        let first = emit(CHUNKS, mode, options.clone());
        let second = emit(CHUNKS, mode, options);
        let units = |files: &[GeneratedFile]| -> Vec<(String, String)> {
            files
                .iter()
                .map(|f| (f.path.clone(), f.content.clone()))
                .collect()
        };
        assert_eq!(units(&first), units(&second), "{mode:?}");
    }
}

/// Writes a fixed models module and records what it was asked to compile.
#[derive(Default)]
struct FakeCompiler {
    calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    fail: bool,
    write_output: bool,
}

impl ModelCompiler for FakeCompiler {
    fn compile(&self, schema_file: &Path, output_file: &Path) -> Result<(), GeneratorError> {
        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(schema_file).unwrap()).unwrap();
        assert_eq!(document["openapi"], "3.0.3");
        self.calls
            .borrow_mut()
            .push((schema_file.to_path_buf(), output_file.to_path_buf()));
        if self.fail {
            return Err(GeneratorError::ExternalCompiler {
                program: "fake".to_string(),
                reason: "exit status: 1".to_string(),
            });
        }
        if self.write_output {
            fs::write(output_file, "class ChunkMetadata: ...\n").unwrap();
        }
        Ok(())
    }

    fn program(&self) -> &str {
        "fake"
    }
}

fn config_in(dir: &Path) -> SdkgenConfig {
    let input = dir.join("openapi.yaml");
    fs::write(&input, CHUNKS).unwrap();
    SdkgenConfig {
        input: input.to_string_lossy().into_owned(),
        sdk_output_path: dir.join("sdk").to_string_lossy().into_owned(),
        models_output_path: dir.join("sdk/models").to_string_lossy().into_owned(),
        include_tests: true,
        ..SdkgenConfig::default()
    }
}

#[test]
fn pipeline_promotes_everything_after_compiling() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let compiler = FakeCompiler {
        write_output: true,
        ..FakeCompiler::default()
    };

    let report = pipeline::run(&config, Some(&compiler)).unwrap();
    let sdk = dir.path().join("sdk");
    assert_eq!(report.package, "trieve_api");
    assert_eq!(report.operations, 5);
    assert_eq!(report.groups, 3);
    assert_eq!(report.models, ModelsOutcome::Compiled(sdk.join("models/models.py")));
    for path in [
        "trieve_api/client.py",
        "trieve_api/tags/chunk_group.py",
        "requirements.txt",
        "tests/conftest.py",
        "tests/test_client.py",
        "tests/test_chunk.py",
        "models/models.py",
        "models/__init__.py",
    ] {
        assert!(sdk.join(path).is_file(), "{path}");
        assert!(report.written.contains(&sdk.join(path)), "{path}");
    }

    // The schema input lived in staging only.
    let calls = compiler.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].0.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".sdkgen-staging-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn failed_compiler_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let compiler = FakeCompiler {
        fail: true,
        ..FakeCompiler::default()
    };

    let err = pipeline::run(&config, Some(&compiler)).unwrap_err();
    assert_eq!(err.stage(), Stage::Compile);
    assert!(!dir.path().join("sdk").exists());
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the input document remains");
}

#[test]
fn compiler_without_output_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let err = pipeline::run(&config, Some(&FakeCompiler::default())).unwrap_err();
    assert!(matches!(err, GeneratorError::ExternalCompiler { ref reason, .. } if reason.contains("models.py")));
    assert!(!dir.path().join("sdk").exists());
}

#[test]
fn ignored_paths_are_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = SdkgenConfig {
        ignores: vec!["/tests/".to_string(), "models\\.py$".to_string()],
        ..config_in(dir.path())
    };
    let compiler = FakeCompiler {
        write_output: true,
        ..FakeCompiler::default()
    };

    let report = pipeline::run(&config, Some(&compiler)).unwrap();
    let sdk = dir.path().join("sdk");
    assert_eq!(report.models, ModelsOutcome::Ignored);
    assert!(compiler.calls.borrow().is_empty());
    assert!(!sdk.join("tests").exists());
    assert!(!sdk.join("models").exists());
    assert!(sdk.join("trieve_api/client.py").is_file());
}

#[test]
fn skipping_models_still_writes_the_client() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let report = pipeline::run(&config, None).unwrap();
    assert_eq!(report.models, ModelsOutcome::Skipped);
    assert!(dir.path().join("sdk/trieve_api/client.py").is_file());
    assert!(!dir.path().join("sdk/models").exists());
}

#[test]
fn transform_errors_surface_with_their_stage() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.yaml");
    fs::write(
        &input,
        r#"
openapi: 3.0.3
info: {title: T, version: '1'}
paths:
  /a:
    get:
      operationId: same
      tags: [x]
      responses: {}
  /b:
    get:
      operationId: same
      tags: [x]
      responses: {}
"#,
    )
    .unwrap();
    let config = SdkgenConfig {
        input: input.to_string_lossy().into_owned(),
        sdk_output_path: dir.path().join("sdk").to_string_lossy().into_owned(),
        ..SdkgenConfig::default()
    };
    let err = pipeline::run(&config, None).unwrap_err();
    assert_eq!(err.stage(), Stage::Classify);
    assert!(err.to_string().contains("same"));
    assert!(!dir.path().join("sdk").exists());
}
