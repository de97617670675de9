use serde::{Deserialize, Serialize};

/// Relation name that marks the next page of a listing.
pub const NEXT_PAGE_REL: &str = "nextPage";

/// HAL-style link embedded in API responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub rel: String,
    pub uri: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kind: None,
            rel: rel.into(),
            uri: uri.into(),
        }
    }
}

/// Envelope returned by listing endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl<T> PaginatedResponse<T> {
    pub fn next_page_link(&self) -> Option<&Link> {
        self.links
            .as_deref()
            .and_then(|links| links.iter().find(|link| link.rel == NEXT_PAGE_REL))
    }
}

/// Target accepted by [`DeereClient::follow_link`](crate::DeereClient::follow_link).
#[derive(Clone, Copy, Debug)]
pub enum LinkTarget<'a> {
    Uri(&'a str),
    Link(&'a Link),
}

impl<'a> LinkTarget<'a> {
    pub fn uri(&self) -> &'a str {
        match self {
            Self::Uri(uri) => uri,
            Self::Link(link) => &link.uri,
        }
    }
}

impl<'a> From<&'a str> for LinkTarget<'a> {
    fn from(uri: &'a str) -> Self {
        Self::Uri(uri)
    }
}

impl<'a> From<&'a String> for LinkTarget<'a> {
    fn from(uri: &'a String) -> Self {
        Self::Uri(uri)
    }
}

impl<'a> From<&'a Link> for LinkTarget<'a> {
    fn from(link: &'a Link) -> Self {
        Self::Link(link)
    }
}

/// Decoded body of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// 204, `Content-Length: 0`, or an empty payload.
    Empty,
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Deserializes into `T`. `Empty` reads as JSON `null`, `Text` as a JSON string.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let value = match self {
            Self::Empty => serde_json::Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => serde_json::Value::String(text),
        };
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Link, PaginatedResponse, ResponseBody};

    #[test]
    fn envelope_tolerates_missing_optional_fields() {
        let page: PaginatedResponse<u32> = serde_json::from_value(json!({ "values": [1, 2] }))
            .expect("envelope must decode");
        assert_eq!(page.values, vec![1, 2]);
        assert!(page.total.is_none());
        assert!(page.next_page_link().is_none());
    }

    #[test]
    fn next_page_link_requires_exact_relation() {
        let page: PaginatedResponse<u32> = serde_json::from_value(json!({
            "values": [],
            "links": [
                { "rel": "self", "uri": "/a" },
                { "rel": "nextpage", "uri": "/b" },
                { "@type": "Link", "rel": "nextPage", "uri": "/c" }
            ]
        }))
        .expect("envelope must decode");
        let next = page.next_page_link().expect("nextPage link must be found");
        assert_eq!(next.uri, "/c");
        assert_eq!(next.kind.as_deref(), Some("Link"));
    }

    #[test]
    fn empty_body_decodes_to_none_and_unit() {
        let none: Option<u32> = ResponseBody::Empty.decode().expect("Option must accept null");
        assert!(none.is_none());
        let _: () = ResponseBody::Empty.decode().expect("unit must accept null");
    }

    #[test]
    fn text_body_decodes_to_string() {
        let text: String = ResponseBody::Text("plain".to_owned())
            .decode()
            .expect("text must decode as string");
        assert_eq!(text, "plain");
    }

    #[test]
    fn link_serializes_without_absent_type() {
        let value = serde_json::to_value(Link::new("nextPage", "/x")).expect("link must encode");
        assert_eq!(value, json!({ "rel": "nextPage", "uri": "/x" }));
    }
}
