use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REQUEST_HEADERS;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::GET,
        }
    }

    /// Whether a request body is attached for this method
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

/// One `Key: Value` line of a header block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderEntry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Full state of one tab, as written to `open-tabs/<id>.json`.
///
/// Request fields are always present. Response fields stay `None` until the
/// tab sends for the first time, and are left out of the JSON while unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestData {
    pub id: String,
    pub method: HttpMethod,
    pub url: String,
    pub request_body: String,
    pub request_headers: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl RequestData {
    /// A fresh tab with a newly generated id and the default header block
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        RequestData {
            id: id.into(),
            request_headers: DEFAULT_REQUEST_HEADERS.to_string(),
            ..RequestData::default()
        }
    }

    /// True while the tab has never been sent
    pub fn is_unsent(&self) -> bool {
        self.response_body.is_none()
            && self.response_headers.is_none()
            && self.status.is_none()
            && self.time.is_none()
            && self.size.is_none()
    }

    /// Short label for a tab strip
    pub fn title(&self) -> String {
        let target = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        if target.is_empty() {
            format!("{} New Request", self.method.as_str())
        } else {
            let short: String = target.chars().take(24).collect();
            format!("{} {}", self.method.as_str(), short)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tabs_get_unique_ids_and_defaults() {
        let a = RequestData::new();
        let b = RequestData::new();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.method, HttpMethod::GET);
        assert_eq!(a.request_headers, DEFAULT_REQUEST_HEADERS);
        assert!(a.is_unsent());
    }

    #[test]
    fn test_serializes_camel_case_and_omits_unset_response() {
        let mut data = RequestData::with_id("tab-1");
        data.request_body = "{}".into();
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["id"], "tab-1");
        assert_eq!(json["method"], "GET");
        assert_eq!(json["requestBody"], "{}");
        assert!(json.get("requestHeaders").is_some());
        assert!(json.get("responseBody").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_deserializes_partial_and_null_fields() {
        let json = r#"{"id":"abc","method":"PATCH","url":"http://x","status":null}"#;
        let data: RequestData = serde_json::from_str(json).unwrap();
        assert_eq!(data.id, "abc");
        assert_eq!(data.method, HttpMethod::PATCH);
        assert_eq!(data.request_body, "");
        assert_eq!(data.status, None);
        assert!(data.is_unsent());
    }

    #[test]
    fn test_method_cycle_and_body_rules() {
        let mut method = HttpMethod::GET;
        for _ in 0..HttpMethod::ALL.len() {
            method = method.next();
        }
        assert_eq!(method, HttpMethod::GET);
        assert!(!HttpMethod::GET.has_body());
        assert!(!HttpMethod::DELETE.has_body());
        assert!(HttpMethod::PATCH.has_body());
    }

    #[test]
    fn test_title() {
        let mut data = RequestData::with_id("t");
        assert_eq!(data.title(), "GET New Request");
        data.method = HttpMethod::POST;
        data.url = "https://api.example.com/users".into();
        assert_eq!(data.title(), "POST api.example.com/users");
    }
}
