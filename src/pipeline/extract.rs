//! Extraction gateway: forwards a course URL to the extraction service.
//!
//! The service does the scraping; this side validates the input, relays the
//! request and translates failures into [`WizardError`]s a caller can act on.

use crate::error::WizardError;
use crate::types::ExtractedData;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info};

/// Body of an extract request. `url` is kept untyped so a non-string value
/// is reported as a missing URL instead of a JSON error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<Value>,
}

impl ExtractRequest {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(Value::String(url.into())),
        }
    }

    /// The trimmed URL, or `InvalidInput` when missing, non-string or blank.
    pub fn validated_url(&self) -> Result<&str, WizardError> {
        match self.url {
            Some(Value::String(ref s)) if !s.trim().is_empty() => Ok(s.trim()),
            _ => Err(WizardError::invalid_input("url is required")),
        }
    }
}

/// Operator guidance appended to connection failures.
pub fn unreachable_hint(base_url: &str) -> String {
    format!(
        "Is the extraction service running? Start it so it listens on {base_url} \
(cd python-service && uvicorn main:app --port 8000) or set WHITEPAPER_EXTRACTOR_URL."
    )
}

/// Pull a human-readable message out of a backend error payload.
///
/// `{"detail": [{"msg": ...}, ...]}` yields the first `msg`; a plain
/// `detail` is used as-is; anything else falls back to `"Extract failed"`.
pub fn backend_error_message(payload: &Value) -> String {
    let detail = &payload["detail"];
    let detail = match detail {
        Value::Array(items) => items
            .first()
            .map(|item| &item["msg"])
            .filter(|msg| !msg.is_null())
            .unwrap_or(detail),
        other => other,
    };
    match detail {
        Value::Null => "Extract failed".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_chain(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

/// POST `{base_url}/extract` and decode the result.
pub async fn extract(
    client: &reqwest::Client,
    base_url: &str,
    req: &ExtractRequest,
) -> Result<ExtractedData, WizardError> {
    let url = req.validated_url()?;
    let endpoint = format!("{}/extract", base_url.trim_end_matches('/'));
    info!("Extracting {} via {}", url, endpoint);
    let start = Instant::now();

    let response = client
        .post(&endpoint)
        .json(&json!({ "url": url }))
        .send()
        .await
        .map_err(|e| WizardError::Gateway {
            message: format!("{} ({})", unreachable_hint(base_url), error_chain(&e)),
        })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|e| WizardError::Gateway {
        message: format!("Reading the extraction response failed: {}", error_chain(&e)),
    })?;
    let payload: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    if !status.is_success() {
        let message = backend_error_message(&payload);
        debug!("Extraction backend returned {}: {}", status, message);
        return Err(WizardError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    let data: ExtractedData = serde_json::from_value(payload).map_err(|e| WizardError::Gateway {
        message: format!("Extraction service returned an unexpected payload: {e}"),
    })?;
    info!(
        "Extracted '{}': {} sections, {} benefits in {:?}",
        data.title.as_deref().unwrap_or("(untitled)"),
        data.content_sections.len(),
        data.key_benefits.len(),
        start.elapsed()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert_eq!(ExtractRequest::for_url("  https://x.nl/a ").validated_url().unwrap(), "https://x.nl/a");
        for bad in [None, Some(json!("   ")), Some(json!(42)), Some(Value::Null)] {
            let req = ExtractRequest { url: bad };
            let err = req.validated_url().unwrap_err();
            assert_eq!(err.to_string(), "url is required");
        }
    }

    #[test]
    fn validation_error_messages() {
        let list = json!({"detail": [{"loc": ["body", "url"], "msg": "field required"}]});
        assert_eq!(backend_error_message(&list), "field required");

        let plain = json!({"detail": "Page not found"});
        assert_eq!(backend_error_message(&plain), "Page not found");

        let empty_list = json!({"detail": []});
        assert_eq!(backend_error_message(&empty_list), "[]");

        let structured = json!({"detail": {"code": 7}});
        assert_eq!(backend_error_message(&structured), r#"{"code":7}"#);

        assert_eq!(backend_error_message(&json!({})), "Extract failed");
        assert_eq!(backend_error_message(&json!("oops")), "Extract failed");
    }

    #[test]
    fn hint_names_base_url() {
        assert!(unreachable_hint("http://127.0.0.1:8000").contains("http://127.0.0.1:8000"));
    }
}
