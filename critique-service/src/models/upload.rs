use axum::body::Bytes;

/// Multipart field that carries the photo.
pub const IMAGE_FIELD: &str = "image";

/// The photo taken from an upload request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    /// As declared by the client; not used to label the outgoing payload.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
