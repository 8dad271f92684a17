use sdkgen_core::GeneratedFile;

/// Runtime dependencies of the emitted client.
const REQUIREMENTS: &[&str] = &["httpx>=0.27", "pydantic>=2.0"];

/// Emit `requirements.txt`.
pub fn emit_requirements() -> GeneratedFile {
    let mut content = REQUIREMENTS.join("\n");
    content.push('\n');
    GeneratedFile::new("requirements.txt", content)
}
