//! File attachments sent along with a chat message
//!
//! Images travel to the language model as inline base64 parts; everything
//! else is read as text and appended to the prompt.

use crate::error::{ParleyError, Result};
use crate::providers::InlinePart;
use std::path::Path;

/// How an attachment is handed to the language model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Sent as an inline image part
    Image,
    /// Read as text and appended to the prompt
    Text,
}

/// A file attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the user
    pub name: String,
    /// Detected media type
    pub mime_type: String,
    /// Image or text
    pub kind: AttachmentKind,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Load an attachment from disk
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Attachment` if the path is not a readable file or
    /// is larger than `max_size` bytes
    pub async fn load(path: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            ParleyError::Attachment(format!("Cannot read {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(
                ParleyError::Attachment(format!("{} is not a file", path.display())).into(),
            );
        }
        if metadata.len() > max_size {
            return Err(ParleyError::Attachment(format!(
                "{} is {} bytes, larger than the {} byte limit",
                path.display(),
                metadata.len(),
                max_size
            ))
            .into());
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ParleyError::Attachment(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(name = %name, size = bytes.len(), "Loaded attachment");
        Ok(Self::from_bytes(name, bytes))
    }

    /// Build an attachment from in-memory contents
    ///
    /// Known image extensions are confirmed by sniffing the contents; files
    /// with an unknown extension are sniffed as well and treated as text when
    /// they are not a recognizable image.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::attachments::{Attachment, AttachmentKind};
    ///
    /// let png = Attachment::from_bytes("pixel", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec());
    /// assert_eq!(png.kind, AttachmentKind::Image);
    /// assert_eq!(png.mime_type, "image/png");
    ///
    /// let notes = Attachment::from_bytes("notes.md", b"# Notes".to_vec());
    /// assert_eq!(notes.kind, AttachmentKind::Text);
    /// assert_eq!(notes.mime_type, "text/markdown");
    /// ```
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let (kind, mime_type) = match extension.as_deref() {
            Some(ext) if is_image_extension(ext) => {
                let mime = sniff_image(&bytes).unwrap_or_else(|| {
                    image::ImageFormat::from_extension(ext)
                        .map(|f| f.to_mime_type())
                        .unwrap_or("application/octet-stream")
                });
                (AttachmentKind::Image, mime)
            }
            ext => match (ext.and_then(text_mime), sniff_image(&bytes)) {
                (Some(mime), _) => (AttachmentKind::Text, mime),
                (None, Some(mime)) => (AttachmentKind::Image, mime),
                (None, None) => (AttachmentKind::Text, "text/plain"),
            },
        };

        Self {
            name,
            mime_type: mime_type.to_string(),
            kind,
            bytes,
        }
    }

    /// Whether this attachment is sent as an image
    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image
    }

    /// Contents decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Encode the contents as an inline model part
    pub fn to_inline_part(&self) -> InlinePart {
        InlinePart::from_bytes(self.mime_type.clone(), &self.bytes)
    }
}

/// Whether an extension names an image format
///
/// # Examples
///
/// ```
/// use parley::attachments::is_image_extension;
///
/// assert!(is_image_extension("png"));
/// assert!(!is_image_extension("txt"));
/// ```
pub fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}

fn text_mime(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "txt" | "log" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        format @ (image::ImageFormat::Png
        | image::ImageFormat::Jpeg
        | image::ImageFormat::WebP
        | image::ImageFormat::Gif
        | image::ImageFormat::Bmp
        | image::ImageFormat::Tiff) => Some(format.to_mime_type()),
        _ => None,
    }
}

/// Split attachments into images and text files, keeping their order
pub fn partition(attachments: &[Attachment]) -> (Vec<&Attachment>, Vec<&Attachment>) {
    attachments.iter().partition(|a| a.is_image())
}
