//! Asking a generative model to read schedule documents.

mod gemini;
pub mod prompt;

pub use gemini::GeminiExtractor;

use crate::error::{AppResult, Error};
use async_trait::async_trait;
use std::path::Path;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension
    pub fn from_file_name(file_name: &str) -> AppResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "jpg" | "jpeg" => Ok(DocumentKind::Jpeg),
            "png" => Ok(DocumentKind::Png),
            _ => Err(Error::UnsupportedFile(file_name.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Png => "image/png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Jpeg => "JPEG image",
            DocumentKind::Png => "PNG image",
        }
    }
}

/// An uploaded schedule document
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
    /// Calendar color requested for the extracted events
    pub color_id: String,
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        color_id: impl Into<String>,
    ) -> AppResult<Self> {
        let file_name = file_name.into();
        let kind = DocumentKind::from_file_name(&file_name)?;
        Ok(Self {
            file_name,
            kind,
            bytes,
            color_id: color_id.into(),
        })
    }

    /// File name without directories or extension
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Turns a document into model text containing a JSON array of events
#[async_trait]
pub trait EventExtractor: Send + Sync + 'static {
    async fn extract_events(&self, document: &Document) -> AppResult<String>;
}
