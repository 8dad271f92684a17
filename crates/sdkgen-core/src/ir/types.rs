use std::fmt;

use indexmap::IndexMap;

use super::operations::IrOperation;

/// A fully resolved, classified representation of an OpenAPI document.
#[derive(Debug, Clone)]
pub struct IrSpec {
    pub info: IrInfo,
    pub servers: Vec<IrServer>,
    pub operations: Vec<IrOperation>,
    /// Schema component name → binding, in document order.
    pub schemas: IndexMap<String, NameBinding>,
    /// Header-borne credentials declared under `securitySchemes`.
    pub auth_schemes: Vec<AuthScheme>,
    /// Original tag name → description from the top-level `tags` list.
    pub tag_descriptions: IndexMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// API metadata.
#[derive(Debug, Clone)]
pub struct IrInfo {
    pub title: NameBinding,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct IrServer {
    pub url: String,
    pub description: Option<String>,
}

/// A source string with its type-style and member-style identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameBinding {
    pub original: String,
    /// `ChunkGroup`
    pub type_name: String,
    /// `chunk_group`
    pub member_name: String,
}

impl fmt::Display for NameBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// A credential the client constructor accepts and sends as a header.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthScheme {
    /// Key under `components.securitySchemes`.
    pub scheme: String,
    pub binding: NameBinding,
    pub header: String,
    /// Prepended to the credential (`Bearer `) for token schemes.
    pub prefix: Option<String>,
    /// Listed in the document-level `security` requirements.
    pub required: bool,
    pub description: Option<String>,
}

/// A recoverable condition found while transforming the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    CyclicReference { chain: Vec<String> },
    DefaultTagAssigned { operation: String, tag: String },
    CookieParameterSkipped { operation: String, parameter: String },
    UnsupportedAuthScheme { scheme: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CyclicReference { chain } => {
                write!(f, "cyclic reference {} (emitted as a forward reference)", chain.join(" → "))
            }
            Diagnostic::DefaultTagAssigned { operation, tag } => {
                write!(f, "operation `{operation}` has no tag; assigned to `{tag}`")
            }
            Diagnostic::CookieParameterSkipped {
                operation,
                parameter,
            } => write!(
                f,
                "cookie parameter `{parameter}` on `{operation}` is not supported and was skipped"
            ),
            Diagnostic::UnsupportedAuthScheme { scheme } => write!(
                f,
                "security scheme `{scheme}` is not header-borne; the client will not send it"
            ),
        }
    }
}
