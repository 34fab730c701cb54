//! HTTP client for the analysis, session, and progress API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use verbgravity_core::error::BackendError;
use verbgravity_core::model::Passage;
use verbgravity_core::traits::{
    CreateSessionRequest, PassageAnalyzer, ProgressRecord, ProgressSink, SessionSnapshot,
    SessionStore,
};

/// Longest passage the analysis endpoint accepts, in characters.
pub const MAX_PASSAGE_CHARS: usize = 2000;

/// REST backend implementing every collaborator trait.
pub struct HttpBackend {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::Network(e.to_string())
            }
        })
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    passage: &'a str,
}

#[derive(Deserialize)]
struct CreatedSession {
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Turn a non-success response into `BackendError::Api`, preferring the
/// server's `detail` message over the raw body.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    BackendError::Api { status, message }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl PassageAnalyzer for HttpBackend {
    #[instrument(skip(self, passage), fields(chars = passage.chars().count()))]
    async fn analyze(&self, passage: &str) -> anyhow::Result<Passage> {
        let chars = passage.chars().count();
        if chars > MAX_PASSAGE_CHARS {
            anyhow::bail!("passage is too long ({chars} chars, max {MAX_PASSAGE_CHARS})");
        }

        let response = self
            .send(
                self.client
                    .post(self.url("/api/analyze-passage"))
                    .json(&AnalyzeRequest { passage }),
            )
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let passage: Passage = decode(response).await?;
        tracing::info!(sentences = passage.sentences.len(), model = %passage.meta.model, "passage analysed");
        Ok(passage)
    }
}

#[async_trait]
impl SessionStore for HttpBackend {
    #[instrument(skip(self, request), fields(sentences = request.total_sentences, mode = %request.mode))]
    async fn create_session(&self, request: &CreateSessionRequest) -> anyhow::Result<String> {
        let response = self
            .send(self.client.post(self.url("/api/sessions")).json(request))
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let created: CreatedSession = decode(response).await?;
        tracing::info!(session = %created.id, "session created");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> anyhow::Result<Option<SessionSnapshot>> {
        let response = self
            .send(self.client.get(self.url(&format!("/api/sessions/{session_id}"))))
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(session = session_id, "session not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        Ok(Some(decode(response).await?))
    }
}

#[async_trait]
impl ProgressSink for HttpBackend {
    #[instrument(skip(self, record), fields(sentence = record.sentence_index))]
    async fn save_progress(&self, session_id: &str, record: &ProgressRecord) -> anyhow::Result<()> {
        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/api/sessions/{session_id}/progress")))
                    .json(record),
            )
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(session_id.to_string()).into());
        }
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verbgravity_core::model::GradingMode;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn analysis() -> serde_json::Value {
        serde_json::json!({
            "sentences": [{
                "id": 0,
                "text": "Dogs bark.",
                "tokens": [
                    {"id": 0, "text": "Dogs", "start": 0, "end": 4, "pos": "NOUN", "tag": "NNS", "dep": "nsubj"},
                    {"id": 1, "text": "bark", "start": 5, "end": 9, "pos": "VERB", "tag": "VBP", "dep": "ROOT"},
                    {"id": 2, "text": ".", "start": 9, "end": 10, "pos": "PUNCT", "tag": ".", "dep": "punct"}
                ],
                "key": {"roots": [1], "subjects": [0], "subjectSpans": [[0]]}
            }],
            "meta": {"totalSentences": 1, "model": "en_core_web_sm"}
        })
    }

    #[tokio::test]
    async fn analyze_passage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze-passage"))
            .and(body_json(serde_json::json!({"passage": "Dogs bark."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis()))
            .mount(&server)
            .await;

        let passage = backend(&server).analyze("Dogs bark.").await.unwrap();
        assert_eq!(passage.sentences.len(), 1);
        assert_eq!(passage.sentences[0].key.roots, vec![1]);
        assert_eq!(passage.meta.total_sentences, 1);
    }

    #[tokio::test]
    async fn analyze_rejects_long_passage_locally() {
        let server = MockServer::start().await;
        let long = "a".repeat(MAX_PASSAGE_CHARS + 1);
        let err = backend(&server).analyze(&long).await.unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn api_error_uses_detail_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze-passage"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"detail": "model not loaded"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server).analyze("Dogs bark.").await.unwrap_err();
        match err.downcast_ref::<BackendError>() {
            Some(BackendError::Api { status, message }) => {
                assert_eq!(*status, 500);
                assert_eq!(message, "model not loaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze-passage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend(&server).analyze("Dogs bark.").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn create_and_get_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(body_json(serde_json::json!({
                "passage_text": "Dogs bark.",
                "total_sentences": 1,
                "mode": "CORE"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "abc"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc",
                "created_at": "2026-01-01T00:00:00",
                "passage_text": "Dogs bark.",
                "total_sentences": 1,
                "mode": "CORE",
                "progress": [{
                    "sentence_index": 0,
                    "root_answer": 1,
                    "root_correct": true,
                    "subject_answer": null,
                    "subject_correct": false
                }]
            })))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let id = backend
            .create_session(&CreateSessionRequest {
                passage_text: "Dogs bark.".into(),
                total_sentences: 1,
                mode: GradingMode::Core,
            })
            .await
            .unwrap();
        assert_eq!(id, "abc");

        let snapshot = backend.get_session(&id).await.unwrap().unwrap();
        assert_eq!(snapshot.mode, GradingMode::Core);
        assert_eq!(snapshot.progress.len(), 1);
        assert!(!snapshot.progress[0].subject_correct);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Session not found"})),
            )
            .mount(&server)
            .await;

        assert!(backend(&server).get_session("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_progress_puts_record() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/sessions/abc/progress"))
            .and(body_json(serde_json::json!({
                "sentence_index": 2,
                "root_answer": 4,
                "root_correct": true,
                "subject_answer": 1,
                "subject_correct": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let record = ProgressRecord {
            sentence_index: 2,
            root_answer: Some(4),
            root_correct: true,
            subject_answer: Some(1),
            subject_correct: false,
        };
        backend(&server).save_progress("abc", &record).await.unwrap();
    }

    #[tokio::test]
    async fn save_progress_to_unknown_session() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/sessions/nope/progress"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let record = ProgressRecord {
            sentence_index: 0,
            root_answer: None,
            root_correct: false,
            subject_answer: None,
            subject_correct: false,
        };
        let err = backend(&server).save_progress("nope", &record).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::NotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = backend.get_session("abc").await.unwrap_err();
        assert!(err.downcast_ref::<BackendError>().is_some());
    }
}
