use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::types::NameBinding;
use crate::resolve::ResolvedSchema;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified API operation.
#[derive(Debug, Clone)]
pub struct IrOperation {
    /// Document-unique identifier (operationId, alias or route-derived).
    pub id: String,
    pub name: NameBinding,
    pub tag: NameBinding,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Grouped by role in [`ParameterRole`] order, required-first within each role.
    pub parameters: Vec<IrParameter>,
    pub request_body: Option<IrRequestBody>,
    /// Ascending by [`StatusCode`].
    pub responses: Vec<IrResponse>,
    pub return_type: ReturnType,
    /// `security: []` on the operation.
    pub skip_auth: bool,
}

impl IrOperation {
    pub fn params_by_role(&self, role: ParameterRole) -> impl Iterator<Item = &IrParameter> {
        self.parameters.iter().filter(move |p| p.role == role)
    }

    /// Parameters that appear in the method signature: call-level ones,
    /// all required before all optional, role order kept within each half.
    pub fn signature(&self) -> Vec<&IrParameter> {
        let call_level = || {
            self.parameters
                .iter()
                .filter(|p| p.header_scope != HeaderScope::Constructor)
        };
        call_level()
            .filter(|p| p.required)
            .chain(call_level().filter(|p| !p.required))
            .collect()
    }

    /// Constructor-level headers this operation declares.
    pub fn constructor_headers(&self) -> impl Iterator<Item = &IrParameter> {
        self.parameters
            .iter()
            .filter(|p| p.header_scope == HeaderScope::Constructor)
    }

    pub fn body_param(&self) -> Option<&IrParameter> {
        self.params_by_role(ParameterRole::Body).next()
    }

    /// Whether some documented status has no body while others do.
    pub fn may_return_nothing(&self) -> bool {
        !matches!(self.return_type, ReturnType::NoContent)
            && self
                .responses
                .iter()
                .any(|r| matches!(r.shape, ResponseShape::NoContent))
    }
}

/// Call-site role of a parameter. Declaration order is signature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterRole {
    Header,
    Path,
    Query,
    Body,
}

impl ParameterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterRole::Header => "header",
            ParameterRole::Path => "path",
            ParameterRole::Query => "query",
            ParameterRole::Body => "body",
        }
    }
}

impl fmt::Display for ParameterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a header is supplied once to the client or on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderScope {
    Constructor,
    #[default]
    Call,
}

/// A classified parameter. Identity is `(original_name, role)`.
#[derive(Debug, Clone)]
pub struct IrParameter {
    pub name: NameBinding,
    pub original_name: String,
    pub role: ParameterRole,
    pub required: bool,
    pub shape: Arc<ResolvedSchema>,
    pub description: Option<String>,
    pub header_scope: HeaderScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyContent {
    Json,
    Text,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct IrRequestBody {
    pub required: bool,
    pub content: BodyContent,
    pub media_type: String,
    pub shape: Arc<ResolvedSchema>,
    pub description: Option<String>,
    /// Schema components the body depends on, transitively. Empty unless JSON.
    pub dependencies: Vec<String>,
}

/// A response status key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Exact(u16),
    /// `4XX` style range, holding the class digit.
    Range(u8),
    Default,
}

impl StatusCode {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("default") {
            return Some(StatusCode::Default);
        }
        let bytes = raw.as_bytes();
        if bytes.len() == 3 && bytes[1..].eq_ignore_ascii_case(b"xx") {
            let class = (bytes[0] as char).to_digit(10)?;
            return (1..=5)
                .contains(&class)
                .then_some(StatusCode::Range(class as u8));
        }
        raw.parse::<u16>()
            .ok()
            .filter(|c| (100..600).contains(c))
            .map(StatusCode::Exact)
    }

    /// Exact codes, then the range of the same class, `default` last.
    fn sort_key(&self) -> (u16, u8, u16) {
        match *self {
            StatusCode::Exact(code) => (code / 100, 0, code),
            StatusCode::Range(class) => (u16::from(class), 1, 0),
            StatusCode::Default => (u16::MAX, 0, 0),
        }
    }

    /// The key used in the emitted status → type map.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl Ord for StatusCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for StatusCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Exact(code) => write!(f, "{code}"),
            StatusCode::Range(class) => write!(f, "{class}XX"),
            StatusCode::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResponseShape {
    Content(Arc<ResolvedSchema>),
    NoContent,
}

#[derive(Debug, Clone)]
pub struct IrResponse {
    pub status: StatusCode,
    pub shape: ResponseShape,
    /// Kind of the chosen media type; `None` when the status has no body.
    pub content: Option<BodyContent>,
    pub description: String,
}

/// What the emitted method returns.
#[derive(Debug, Clone)]
pub enum ReturnType {
    NoContent,
    Single(Arc<ResolvedSchema>),
    /// Distinct shapes across every documented status, first-seen in status order.
    Union(Vec<Arc<ResolvedSchema>>),
}

impl ReturnType {
    pub fn from_responses(responses: &[IrResponse]) -> Self {
        let mut distinct: Vec<Arc<ResolvedSchema>> = Vec::new();
        for response in responses {
            if let ResponseShape::Content(shape) = &response.shape {
                if !distinct.iter().any(|seen| seen.same_shape(shape)) {
                    distinct.push(Arc::clone(shape));
                }
            }
        }
        match distinct.len() {
            0 => ReturnType::NoContent,
            1 => ReturnType::Single(distinct.remove(0)),
            _ => ReturnType::Union(distinct),
        }
    }

    pub fn shapes(&self) -> &[Arc<ResolvedSchema>] {
        match self {
            ReturnType::NoContent => &[],
            ReturnType::Single(shape) => std::slice::from_ref(shape),
            ReturnType::Union(shapes) => shapes,
        }
    }
}
