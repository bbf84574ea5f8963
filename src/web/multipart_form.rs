// src/web/multipart_form.rs
use crate::{error::AppResult, services::upload_service::UploadedFile};
use axum::extract::Multipart;
use std::collections::HashMap;

/// A fully buffered multipart body. Parts with a file name are files, the
/// rest are text fields.
#[derive(Debug, Default)]
pub struct MultipartForm {
    files: Vec<(String, UploadedFile)>,
    fields: HashMap<String, String>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if filename.is_some() {
                let bytes = field.bytes().await?.to_vec();
                tracing::debug!("Multipart file part '{}' ({} bytes)", name, bytes.len());
                form.files.push((
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    },
                ));
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    /// Removes and returns the first file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let pos = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(pos).1)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Every file keyed by its uploaded file name, or the field name when the
    /// client sent none.
    pub fn into_named_files(self) -> Vec<(String, Vec<u8>)> {
        self.files
            .into_iter()
            .map(|(field, file)| (file.filename.unwrap_or(field), file.bytes))
            .collect()
    }
}
