use axum::extract::multipart::{Multipart, MultipartError};
use blueprint_estimator::{UploadedDocument, PDF_MEDIA_TYPE};

pub const DOCUMENT_FIELD: &str = "document";
pub const QUESTION_FIELD: &str = "question";

/// The two inputs of the estimate form as they arrived.
#[derive(Debug, Default)]
pub struct EstimateForm {
    pub document: Option<UploadedDocument>,
    pub question: String,
}

impl EstimateForm {
    /// Reads the multipart body. A file input left empty by the browser
    /// (no name, no bytes) is treated as no document; unknown fields are
    /// skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = EstimateForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(DOCUMENT_FIELD) => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .filter(|name| !name.is_empty());
                    let media_type = field
                        .content_type()
                        .unwrap_or(PDF_MEDIA_TYPE)
                        .to_string();
                    let bytes = field.bytes().await?;

                    if bytes.is_empty() && file_name.is_none() {
                        continue;
                    }

                    form.document = Some(UploadedDocument {
                        file_name,
                        media_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Some(QUESTION_FIELD) => {
                    form.question = field.text().await?;
                }
                other => {
                    log::debug!("Ignoring unexpected form field {:?}", other);
                }
            }
        }

        Ok(form)
    }
}
