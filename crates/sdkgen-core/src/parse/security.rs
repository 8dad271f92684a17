use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecuritySchemeType {
    ApiKey,
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    OpenIdConnect,
    #[serde(rename = "mutualTLS")]
    MutualTls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// A security scheme under `components.securitySchemes`.
///
/// Flows and discovery URLs are kept opaque; the generated client only needs
/// to know which header carries the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Header, query or cookie name for `apiKey` schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<ApiKeyLocation>,

    /// `bearer`, `basic`, ... for `http` schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl SecurityScheme {
    /// The request header this scheme is sent in, if it is header-borne.
    pub fn header_name(&self) -> Option<&str> {
        match self.scheme_type {
            SecuritySchemeType::ApiKey => match self.location {
                Some(ApiKeyLocation::Header) => self.name.as_deref(),
                _ => None,
            },
            SecuritySchemeType::Http
            | SecuritySchemeType::OAuth2
            | SecuritySchemeType::OpenIdConnect => Some("Authorization"),
            SecuritySchemeType::MutualTls => None,
        }
    }
}

/// Map of scheme name to required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;
