use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::domain::{AnalysisMode, AnalysisRequest, AnalysisResult, RawScores, Summary};

/// Failure talking to the analysis service. Every variant ends the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("analysis service unreachable: {0}")]
    Unreachable(String),
    #[error("analysis service rejected the request with status {0}")]
    ServerRejected(u16),
    #[error("analysis service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Transport boundary to the analysis service so the orchestrator can be
/// exercised without a network.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn send(&self, request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError>;
}

/// Endpoint path for each mode. Deployments either expose one path per mode or
/// route every mode through a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMap {
    pub readability: String,
    pub tone: String,
    pub plagiarism: String,
}

impl EndpointMap {
    pub fn per_mode() -> Self {
        Self {
            readability: "/analyze_readability".to_string(),
            tone: "/analyze_tone".to_string(),
            plagiarism: "/check_plagiarism".to_string(),
        }
    }

    pub fn unified(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            readability: path.clone(),
            tone: path.clone(),
            plagiarism: path,
        }
    }

    pub fn path(&self, mode: AnalysisMode) -> &str {
        match mode {
            AnalysisMode::Readability => &self.readability,
            AnalysisMode::Tone => &self.tone,
            AnalysisMode::Plagiarism => &self.plagiarism,
        }
    }
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self::per_mode()
    }
}

#[derive(Serialize)]
struct AnalyzePayload<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    summary: Value,
    #[serde(default)]
    raw_scores: Value,
}

/// HTTP implementation posting `{"text": ...}` as JSON to the mode's endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalysisGateway {
    client: reqwest::Client,
    base_url: String,
    endpoints: EndpointMap,
}

impl HttpAnalysisGateway {
    pub fn new(
        base_url: impl Into<String>,
        endpoints: EndpointMap,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Unreachable(format!("http client unavailable: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints,
        })
    }

    pub fn endpoint_url(&self, mode: AnalysisMode) -> String {
        let path = self.endpoints.path(mode);
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    async fn send(&self, request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError> {
        let url = self.endpoint_url(request.mode());
        debug!(%url, mode = %request.mode(), "dispatching analysis request");

        let response = self
            .client
            .post(&url)
            .json(&AnalyzePayload {
                text: request.text(),
            })
            .send()
            .await
            .map_err(|err| GatewayError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::ServerRejected(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Unreachable(err.to_string()))?;

        decode_response(request.mode(), &body)
    }
}

/// Translate a response body into a result for `mode`. A missing summary
/// degrades to an empty one; anything that is not the documented shape is
/// rejected.
pub fn decode_response(mode: AnalysisMode, body: &[u8]) -> Result<AnalysisResult, GatewayError> {
    let AnalyzeResponse {
        summary,
        raw_scores,
    } = serde_json::from_slice::<AnalyzeResponse>(body)
        .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

    let summary = match summary {
        Value::Null => Summary::empty(mode),
        value @ Value::Object(_) => Summary::from_value(mode, value)
            .map_err(|err| GatewayError::InvalidResponse(format!("summary: {err}")))?,
        other => {
            return Err(GatewayError::InvalidResponse(format!(
                "summary must be an object, got {}",
                json_kind(&other)
            )))
        }
    };

    let raw_scores = match raw_scores {
        Value::Null => None,
        Value::Object(entries) => Some(
            entries
                .into_iter()
                .filter_map(|(metric, value)| match value.as_f64() {
                    Some(score) => Some((metric, score)),
                    None => {
                        debug!(%metric, "skipping non-numeric raw score");
                        None
                    }
                })
                .collect::<RawScores>(),
        ),
        other => {
            return Err(GatewayError::InvalidResponse(format!(
                "raw_scores must be an object, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(AnalysisResult::new(summary, raw_scores))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base_url: &str, endpoints: EndpointMap) -> HttpAnalysisGateway {
        HttpAnalysisGateway::new(base_url, endpoints, Duration::from_secs(5))
            .expect("client builds")
    }

    #[test]
    fn per_mode_endpoints_route_each_mode() {
        let gateway = gateway("http://127.0.0.1:8000/", EndpointMap::per_mode());
        assert_eq!(
            gateway.endpoint_url(AnalysisMode::Readability),
            "http://127.0.0.1:8000/analyze_readability"
        );
        assert_eq!(
            gateway.endpoint_url(AnalysisMode::Tone),
            "http://127.0.0.1:8000/analyze_tone"
        );
        assert_eq!(
            gateway.endpoint_url(AnalysisMode::Plagiarism),
            "http://127.0.0.1:8000/check_plagiarism"
        );
    }

    #[test]
    fn unified_endpoint_is_shared() {
        let gateway = gateway("https://example.test", EndpointMap::unified("analyze"));
        for mode in AnalysisMode::ordered() {
            assert_eq!(gateway.endpoint_url(mode), "https://example.test/analyze");
        }
    }

    #[test]
    fn decodes_summary_and_numeric_scores() {
        let body = br#"{
            "summary": {"overall_readability": "Very Easy", "education_level": "Grade 3"},
            "raw_scores": {"flesch_reading_ease": 95.0, "gunning_fog": 4, "label": "n/a"}
        }"#;

        let result = decode_response(AnalysisMode::Readability, body).expect("decodes");
        assert_eq!(result.mode(), AnalysisMode::Readability);
        let scores = result.raw_scores().expect("scores present");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("gunning_fog"), Some(4.0));
        assert_eq!(scores.get("label"), None);
        assert_eq!(
            result.summary().fields()[0],
            ("Overall Readability", Some("Very Easy"))
        );
    }

    #[test]
    fn missing_summary_degrades_to_placeholders() {
        let result = decode_response(AnalysisMode::Plagiarism, b"{}").expect("decodes");
        assert_eq!(result.summary(), &Summary::empty(AnalysisMode::Plagiarism));
        assert!(result.raw_scores().is_none());
    }

    #[test]
    fn rejects_malformed_bodies() {
        let cases: [&[u8]; 5] = [
            b"<html>oops</html>",
            b"[1, 2, 3]",
            br#"{"summary": "fine"}"#,
            br#"{"summary": {}, "raw_scores": [95.0]}"#,
            br#"{"summary": {"feedback": {"nested": true}}, "raw_scores": 3}"#,
        ];

        for body in cases {
            match decode_response(AnalysisMode::Tone, body) {
                Err(GatewayError::InvalidResponse(_)) => {}
                other => panic!(
                    "expected invalid response for {}, got {other:?}",
                    String::from_utf8_lossy(body)
                ),
            }
        }
    }
}
