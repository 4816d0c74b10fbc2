use crate::error::EstimateError;
use crate::gemini_service::GenerationClient;
use crate::models::*;
use crate::prompt_template::{PromptTemplate, ESTIMATION_PROMPT};
use crate::transient_document::{self, TransientDocument};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const VALIDATION_WARNING: &str = "Please upload a PDF and enter your estimation question.";
pub const NOT_A_PDF_WARNING: &str = "Only PDF blueprints can be analyzed. Please upload a PDF file.";

/// Response text on success, the reason otherwise.
pub type EstimationResult = Result<String, EstimateError>;

/// Runs submissions one at a time: validate, stage the upload, render the
/// prompt, call the model once, remove the staged file.
pub struct EstimationService {
    client: Arc<dyn GenerationClient>,
    template: &'static PromptTemplate,
    upload_dir: PathBuf,
    in_flight: Mutex<()>,
}

impl EstimationService {
    pub fn new(client: Arc<dyn GenerationClient>, upload_dir: impl Into<PathBuf>) -> Self {
        let upload_dir = upload_dir.into();

        // Leftover from a process that died mid-submission.
        transient_document::remove_best_effort(&TransientDocument::path_in(&upload_dir));

        Self {
            client,
            template: &ESTIMATION_PROMPT,
            upload_dir,
            in_flight: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_template(mut self, template: &'static PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn transient_path(&self) -> PathBuf {
        TransientDocument::path_in(&self.upload_dir)
    }

    pub async fn submit(&self, document: Option<UploadedDocument>, question: &str) -> EstimationResult {
        let submission_id = Uuid::new_v4();

        // The staged file has a fixed name, so submissions must not overlap.
        let _turn = self.in_flight.lock().await;

        let document = match validate(document, question) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Submission {} rejected: {}", submission_id, e);
                return Err(e);
            }
        };

        log::info!(
            "Submission {}: {} byte document{}, {} char question",
            submission_id,
            document.bytes.len(),
            document
                .file_name
                .as_deref()
                .map(|name| format!(" ({})", name))
                .unwrap_or_default(),
            question.chars().count()
        );

        let staged = TransientDocument::persist(&self.upload_dir, &document.bytes)
            .await
            .map_err(EstimateError::Staging)?;
        drop(document);

        let request = EstimationRequest {
            document: staged.read().await.map_err(EstimateError::Staging)?,
            media_type: PDF_MEDIA_TYPE.to_string(),
            prompt: self.template.render(question),
        };

        let started = Instant::now();
        let result = self.client.generate(&request).await;
        let elapsed_ms = started.elapsed().as_millis();

        drop(staged);

        match result {
            Ok(text) => {
                log::info!(
                    "Submission {} completed in {} ms ({} chars)",
                    submission_id,
                    elapsed_ms,
                    text.chars().count()
                );
                Ok(text)
            }
            Err(e) => {
                let description = format!("{:#}", e);
                log::error!(
                    "Submission {} failed after {} ms: {}",
                    submission_id,
                    elapsed_ms,
                    description
                );
                Err(EstimateError::ExternalCall(description))
            }
        }
    }
}

fn validate(document: Option<UploadedDocument>, question: &str) -> Result<UploadedDocument, EstimateError> {
    let document = match document {
        Some(document) if !document.is_empty() && !question.trim().is_empty() => document,
        _ => return Err(EstimateError::Validation(VALIDATION_WARNING.to_string())),
    };

    if !document.looks_like_pdf() {
        return Err(EstimateError::Validation(NOT_A_PDF_WARNING.to_string()));
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Records every call and whether the staged file existed at that moment.
    struct RecordingClient {
        staged_path: PathBuf,
        reply: Box<dyn Fn() -> Result<String> + Send + Sync>,
        calls: StdMutex<Vec<(EstimationRequest, bool)>>,
    }

    impl RecordingClient {
        fn new(staged_path: &Path, reply: impl Fn() -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                staged_path: staged_path.to_path_buf(),
                reply: Box::new(reply),
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(EstimationRequest, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationClient for RecordingClient {
        async fn generate(&self, request: &EstimationRequest) -> Result<String> {
            let staged = self.staged_path.exists();
            self.calls.lock().unwrap().push((request.clone(), staged));
            (self.reply)()
        }
    }

    const BLUEPRINT: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF";

    fn service(dir: &Path, client: Arc<RecordingClient>) -> EstimationService {
        EstimationService::new(client, dir)
    }

    #[tokio::test]
    async fn valid_submission_makes_one_call_and_returns_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let reply = "## Estimate\n| Item | Cost |\n|---|---|\n| Tile | $1,200 |\n";
        let client = RecordingClient::new(&staged, move || Ok(reply.to_string()));
        let service = service(dir.path(), client.clone());

        let result = service
            .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "Estimate the cost")
            .await;

        assert_eq!(result.unwrap(), reply);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (request, staged_during_call) = &calls[0];
        assert!(*staged_during_call);
        assert_eq!(request.document, BLUEPRINT);
        assert_eq!(request.media_type, PDF_MEDIA_TYPE);
        assert_eq!(request.prompt, ESTIMATION_PROMPT.render("Estimate the cost"));
        assert!(request.prompt.contains("\n\nEstimate the cost\n\n"));

        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn missing_document_is_rejected_without_a_call() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let client = RecordingClient::new(&staged, || Ok("unused".to_string()));
        let service = service(dir.path(), client.clone());

        let err = service.submit(None, "Estimate the cost").await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.to_string(), VALIDATION_WARNING);
        assert!(client.calls().is_empty());
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_a_call() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let client = RecordingClient::new(&staged, || Ok("unused".to_string()));
        let service = service(dir.path(), client.clone());

        for question in ["", "   ", "\n\t "] {
            let err = service
                .submit(Some(UploadedDocument::pdf(BLUEPRINT)), question)
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }

        assert!(client.calls().is_empty());
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn empty_upload_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let client = RecordingClient::new(&TransientDocument::path_in(dir.path()), || Ok(String::new()));
        let service = service(dir.path(), client.clone());

        let err = service
            .submit(Some(UploadedDocument::pdf(Vec::new())), "Estimate the cost")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), VALIDATION_WARNING);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let client = RecordingClient::new(&TransientDocument::path_in(dir.path()), || Ok(String::new()));
        let service = service(dir.path(), client.clone());

        let document = UploadedDocument {
            file_name: Some("notes.txt".to_string()),
            media_type: "text/plain".to_string(),
            bytes: b"just text".to_vec(),
        };
        let err = service.submit(Some(document), "Estimate the cost").await.unwrap_err();

        assert_eq!(err.to_string(), NOT_A_PDF_WARNING);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn call_failure_is_reported_and_file_still_removed() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let client = RecordingClient::new(&staged, || {
            Err(anyhow::anyhow!("operation timed out").context("Gemini request failed"))
        });
        let service = service(dir.path(), client.clone());

        let err = service
            .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "Estimate the cost")
            .await
            .unwrap_err();

        match &err {
            EstimateError::ExternalCall(description) => {
                assert!(description.contains("operation timed out"));
                assert!(description.contains("Gemini request failed"));
            }
            other => panic!("expected ExternalCall, got {:?}", other),
        }
        assert_eq!(client.calls().len(), 1);
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn repeated_submissions_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let client = RecordingClient::new(&staged, || Ok("estimate".to_string()));
        let service = service(dir.path(), client.clone());

        for _ in 0..2 {
            let text = service
                .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "Estimate the cost")
                .await
                .unwrap();
            assert_eq!(text, "estimate");
        }

        assert_eq!(client.calls().len(), 2);
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn staging_failure_skips_the_call() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let client = RecordingClient::new(&TransientDocument::path_in(&missing), || Ok(String::new()));
        let service = service(&missing, client.clone());

        let err = service
            .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "Estimate the cost")
            .await
            .unwrap_err();

        assert!(matches!(err, EstimateError::Staging(_)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_transient_file_is_removed_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        std::fs::write(&staged, b"left over").unwrap();

        let client = RecordingClient::new(&staged, || Ok(String::new()));
        let _service = service(dir.path(), client);

        assert!(!staged.exists());
    }

    /// Swaps the staged file for a directory of the same name, so removing
    /// it fails with something other than NotFound.
    struct DirectorySwapClient {
        staged_path: PathBuf,
    }

    #[async_trait]
    impl GenerationClient for DirectorySwapClient {
        async fn generate(&self, _request: &EstimationRequest) -> Result<String> {
            std::fs::remove_file(&self.staged_path)?;
            std::fs::create_dir(&self.staged_path)?;
            Ok("estimate".to_string())
        }
    }

    #[tokio::test]
    async fn failed_cleanup_does_not_fail_the_submission() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TransientDocument::path_in(dir.path());
        let client = Arc::new(DirectorySwapClient {
            staged_path: staged.clone(),
        });
        let service = EstimationService::new(client, dir.path());

        let text = service
            .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "Estimate the cost")
            .await
            .unwrap();

        assert_eq!(text, "estimate");
        assert!(staged.is_dir());
    }

    struct SlowClient {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl GenerationClient for SlowClient {
        async fn generate(&self, _request: &EstimationRequest) -> Result<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn overlapping_submissions_run_one_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(SlowClient {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let service = EstimationService::new(client.clone(), dir.path());

        let (first, second) = tokio::join!(
            service.submit(Some(UploadedDocument::pdf(BLUEPRINT)), "first"),
            service.submit(Some(UploadedDocument::pdf(BLUEPRINT)), "second"),
        );

        assert_eq!(first.unwrap(), "done");
        assert_eq!(second.unwrap(), "done");
        assert_eq!(client.max_active.load(Ordering::SeqCst), 1);
        assert!(!service.transient_path().exists());
    }

    #[tokio::test]
    async fn custom_template_is_used() {
        static SHORT: PromptTemplate = PromptTemplate::new("Blueprint question: {user_prompt}");

        let dir = tempfile::tempdir().unwrap();
        let client = RecordingClient::new(&TransientDocument::path_in(dir.path()), || Ok("ok".to_string()));
        let service = service(dir.path(), client.clone()).with_template(&SHORT);

        service
            .submit(Some(UploadedDocument::pdf(BLUEPRINT)), "How many tiles?")
            .await
            .unwrap();

        assert_eq!(client.calls()[0].0.prompt, "Blueprint question: How many tiles?");
    }
}
