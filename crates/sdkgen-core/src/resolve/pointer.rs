use percent_encoding::percent_decode_str;

use crate::error::ResolveError;

/// A decoded `#/components/<section>/<name>` pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPointer {
    pub section: String,
    pub name: String,
}

/// Decode a same-document reference into its component section and name.
///
/// Percent-encoding is undone first, then the JSON-pointer escapes `~1`
/// and `~0`, so `#/components/schemas/Foo%20Bar` and
/// `#/components/schemas/Foo Bar` name the same component.
pub fn parse_pointer(ref_path: &str) -> Result<ComponentPointer, ResolveError> {
    let Some(fragment) = ref_path.strip_prefix('#') else {
        return Err(ResolveError::UnsupportedReference(ref_path.to_string()));
    };
    let fragment = percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|_| ResolveError::Unresolvable(ref_path.to_string()))?;

    let segments: Vec<String> = fragment
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();

    match segments.as_slice() {
        [components, section, name] if components == "components" && !name.is_empty() => {
            Ok(ComponentPointer {
                section: section.clone(),
                name: name.clone(),
            })
        }
        _ => Err(ResolveError::Unresolvable(ref_path.to_string())),
    }
}

/// Decode a pointer and require it to live in `expected` (`schemas`, `parameters`, ...).
pub fn component_name(ref_path: &str, expected: &str) -> Result<String, ResolveError> {
    let pointer = parse_pointer(ref_path)?;
    if pointer.section != expected {
        return Err(ResolveError::InvalidReference {
            reference: ref_path.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(pointer.name)
}
