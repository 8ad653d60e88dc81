//! Source documents and the text extracted from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Declared media kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Image,
}

impl MediaKind {
    /// Detect media kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" | "webp" | "gif" => Some(Self::Image),
            _ => None,
        }
    }

    /// Detect media kind from a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.to_lowercase();
        if mime == "application/pdf" {
            Some(Self::Pdf)
        } else if mime.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Detect media kind from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if image::guess_format(bytes).is_ok() {
            Some(Self::Image)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// An uploaded document. Immutable once received.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    kind: MediaKind,
    filename: Option<String>,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, kind: MediaKind) -> Self {
        Self {
            bytes,
            kind,
            filename: None,
        }
    }

    /// Build a document from an upload, resolving the kind from the filename
    /// extension, then the MIME type, then the content itself.
    pub fn from_upload(
        bytes: Vec<u8>,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Option<Self> {
        let by_extension = filename
            .and_then(|f| std::path::Path::new(f).extension())
            .and_then(|e| e.to_str())
            .and_then(MediaKind::from_extension);
        let kind = by_extension
            .or_else(|| content_type.and_then(MediaKind::from_mime))
            .or_else(|| MediaKind::sniff(&bytes))?;

        Some(Self {
            bytes,
            kind,
            filename: filename.map(|f| f.to_string()),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// MIME type of the raw bytes, for multimodal provider requests.
    pub fn mime_type(&self) -> &'static str {
        match self.kind {
            MediaKind::Pdf => "application/pdf",
            MediaKind::Image => image::guess_format(&self.bytes)
                .map(|f| f.to_mime_type())
                .unwrap_or("image/png"),
        }
    }

    /// Short SHA-256 prefix identifying the content in logs.
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex::encode(&digest[..8])
    }
}

/// Best-effort linearization of a document's text. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ExtractedText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for ExtractedText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl AsRef<str> for ExtractedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
