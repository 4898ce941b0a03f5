//! Multipart form intake.
//!
//! Reads an incoming `multipart/form-data` request into the normalized
//! [`FormFields`] structure (text values plus file metadata) together with
//! the raw file bytes keyed by external field name. Mapping and validation
//! operate on the metadata only; the bytes are written to storage after the
//! submission passes validation.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use enroll_core::fields::{FileMeta, FormFields};

use crate::error::AppError;

/// Raw file payloads keyed by external field name.
pub type FileBytes = BTreeMap<String, Vec<u8>>;

/// Drain a multipart stream into form fields and file payloads.
///
/// Fields with a filename are treated as file parts, everything else as
/// UTF-8 text. Duplicate field names keep the last occurrence.
pub async fn read_form(mut multipart: Multipart) -> Result<(FormFields, FileBytes), AppError> {
    let mut form = FormFields::new();
    let mut files = FileBytes::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart payload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read upload '{name}': {e}"))
                })?;
                form.insert_file(
                    name.clone(),
                    FileMeta {
                        filename,
                        size_bytes: bytes.len() as u64,
                        content_type,
                    },
                );
                files.insert(name, bytes.to_vec());
            }
            None => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Field '{name}' is not valid UTF-8: {e}"))
                })?;
                form.insert_text(name, text);
            }
        }
    }

    Ok((form, files))
}
