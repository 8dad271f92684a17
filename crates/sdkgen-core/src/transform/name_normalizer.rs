use std::collections::{HashMap, HashSet};

use heck::ToPascalCase;

use crate::error::TransformError;
use crate::ir::{HttpMethod, NameBinding};

/// Marker put in front of a leading digit.
const DIGIT_MARKER: char = '_';

/// Normalize an arbitrary string into both identifier styles.
///
/// Tokens are split on whitespace, `-`, `_`, any other non-alphanumeric
/// character, and lower→upper case transitions. Letters outside ASCII are
/// kept, since Python identifiers accept them:
/// `Chunk Group`, `chunk-group` and `chunkGroup` all give
/// `ChunkGroup` / `chunk_group`.
pub fn normalize(raw: &str) -> NameBinding {
    let mut tokens = tokenize(raw);
    if tokens.is_empty() {
        tokens.push("unnamed".to_string());
    }
    if tokens[0].starts_with(char::is_numeric) {
        tokens[0].insert(0, DIGIT_MARKER);
    }

    let member_name = tokens
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    let type_name = tokens.iter().map(|t| capitalize(t)).collect();

    NameBinding {
        original: raw.to_string(),
        type_name,
        member_name,
    }
}

fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in raw.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if prev_lower && ch.is_uppercase() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev_lower = ch.is_lowercase();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Derive an operation name from HTTP method + path when there is no operationId.
///
/// - `GET /chunks` → `listChunks`
/// - `GET /chunks/{chunk_id}` → `getChunk`
/// - `POST /chunk_group/{group_id}/chunks` → `createChunkGroupChunks`
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let mut resources: Vec<&str> = Vec::new();
    let mut ends_with_param = false;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        ends_with_param = segment.starts_with('{') && segment.ends_with('}');
        if !ends_with_param {
            resources.push(segment);
        }
    }

    let verb = match method {
        HttpMethod::Get if ends_with_param => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        HttpMethod::Delete => "delete",
        HttpMethod::Patch => "patch",
        HttpMethod::Options => "options",
        HttpMethod::Head => "head",
        HttpMethod::Trace => "trace",
    };

    let last = resources.len().saturating_sub(1);
    let resource: String = resources
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == last && ends_with_param {
                singularize(part).to_pascal_case()
            } else {
                part.to_pascal_case()
            }
        })
        .collect();
    format!("{verb}{resource}")
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        format!("{stem}y")
    } else if ["ses", "xes", "zes"].iter().any(|s| word.ends_with(s)) {
        word[..word.len() - 2].to_string()
    } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Memoized normalization with per-scope collision detection.
///
/// Within a scope every identifier (member or type style) belongs to the
/// first key that produced it; a different key producing it again is a
/// [`TransformError::NameCollision`]. Reserved words get a `_` suffix
/// after the check.
#[derive(Debug, Default)]
pub struct NameRegistry {
    memo: HashMap<String, NameBinding>,
    scopes: HashMap<String, HashMap<String, String>>,
    reserved: HashSet<String>,
}

impl NameRegistry {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Memoized [`normalize`] without scope checks or reserved-word escaping.
    pub fn normalize(&mut self, raw: &str) -> NameBinding {
        self.memo
            .entry(raw.to_string())
            .or_insert_with(|| normalize(raw))
            .clone()
    }

    /// Bind `raw` in `scope`, keyed by the raw string itself.
    pub fn bind(&mut self, scope: &str, raw: &str) -> Result<NameBinding, TransformError> {
        self.bind_as(scope, raw, raw)
    }

    /// Bind `raw` in `scope` under an explicit identity `key`, for scopes where
    /// the same string may legitimately occur twice (e.g. role-qualified parameters).
    pub fn bind_as(
        &mut self,
        scope: &str,
        key: &str,
        raw: &str,
    ) -> Result<NameBinding, TransformError> {
        let base = self.normalize(raw);
        let claimed = self.scopes.entry(scope.to_string()).or_default();
        let slots = [
            (format!("m:{}", base.member_name), &base.member_name),
            (format!("t:{}", base.type_name), &base.type_name),
        ];
        for (slot, identifier) in &slots {
            if let Some(owner) = claimed.get(slot).filter(|owner| *owner != key) {
                return Err(TransformError::NameCollision {
                    scope: scope.to_string(),
                    first: owner.clone(),
                    second: key.to_string(),
                    identifier: (*identifier).clone(),
                });
            }
        }
        for (slot, _) in slots {
            claimed.insert(slot, key.to_string());
        }
        Ok(self.escape(base))
    }

    fn escape(&self, mut binding: NameBinding) -> NameBinding {
        if self.reserved.contains(&binding.member_name) {
            binding.member_name.push('_');
        }
        if self.reserved.contains(&binding.type_name) {
            binding.type_name.push('_');
        }
        binding
    }
}
