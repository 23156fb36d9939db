//! Multipart uploads and file name helpers.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{Error, Result};

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    /// File name as reported by the client. Never trust it as a path.
    pub file_name: String,
    /// Content type as reported by the client.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadedFile {
    /// Write the contents to `dir/name`, returning the full path.
    pub async fn save(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, &self.data).await?;
        tracing::info!(path = %path.display(), bytes = self.data.len(), "saved upload");
        Ok(path)
    }
}

/// Parsed `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: BTreeMap<String, Vec<String>>,
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Parse `body` using the boundary from `content_type`.
    pub async fn parse(content_type: Option<&str>, body: Bytes) -> Result<Self> {
        let content_type = content_type
            .ok_or_else(|| Error::bad_request("Missing multipart content type"))?;
        let boundary = multer::parse_boundary(content_type)?;
        let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(|m| m.to_string());
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }
        Ok(form)
    }

    /// First text value of `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All text fields, first value each.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.first().map(|first| (k.clone(), first.clone())))
            .collect()
    }

    /// First file sent under `name`.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == name)
    }

    /// Every file sent under `name`, in body order.
    pub fn files(&self, name: &str) -> Vec<&UploadedFile> {
        self.files.iter().filter(|f| f.field == name).collect()
    }

    /// Whether any file was sent under `name`.
    pub fn has_file(&self, name: &str) -> bool {
        self.file(name).is_some()
    }
}

/// Whether `filename` has an extension from `allowed` (case-insensitive).
pub fn allowed_file<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| a.as_ref() == ext)
        }
        None => false,
    }
}

/// Random hex name that keeps the original extension: `photo.PNG` becomes
/// `3f2a...e1.PNG`.
pub fn random_filename(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}{}", uuid::Uuid::new_v4().simple(), ext)
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Returns `None` when nothing usable is left.
pub fn secure_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}
