//! Raw form input and the per-field error mapping.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::incident::IncidentType;
use crate::error::{IncidentError, Result};

/// An image chosen by the user
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an image from disk, guessing the content type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| IncidentError::ImageUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = guess_content_type(path).to_string();

        Ok(Self { file_name, content_type, bytes })
    }

    /// Size rounded to whole kilobytes
    pub fn size_kb(&self) -> u64 {
        (self.bytes.len() as f64 / 1024.0).round() as u64
    }

    /// Summary shown under the file picker
    pub fn summary(&self) -> String {
        format!("{} ({} KB)", self.file_name, self.size_kb())
    }
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Raw state of the create form, as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub title: String,
    pub description: String,
    pub incident_type: Option<IncidentType>,
    pub lat: String,
    pub lng: String,
    pub image: Option<ImageAttachment>,
}

impl FormFields {
    /// Reset every field to empty
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Form fields that can carry a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Title,
    IncidentType,
    Location,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Title => "title",
            FieldKey::IncidentType => "incident_type",
            FieldKey::Location => "location",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field key to message mapping; empty means the form is submittable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<FieldKey, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.errors.contains_key(&key)
    }

    /// Set the message for a field, replacing any previous one
    pub fn insert(&mut self, key: FieldKey, message: impl Into<String>) {
        self.errors.insert(key, message.into());
    }

    /// Add a sentence to a field's message, space-separated
    pub fn append(&mut self, key: FieldKey, sentence: &str) {
        self.errors
            .entry(key)
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(sentence);
            })
            .or_insert_with(|| sentence.to_string());
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (key, message) in &self.errors {
            map.serialize_entry(key.as_str(), message)?;
        }
        map.end()
    }
}
