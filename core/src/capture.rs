use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// What a captured frame is meant for. A frame grabbed for identification is
/// repurposed for display once it becomes part of a scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePurpose {
    Identification,
    Display,
}

/// One encoded still frame. Produced once per scan attempt and owned by the
/// orchestrator until the attempt settles or is abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    data: String,
    purpose: ImagePurpose,
}

impl CapturedImage {
    /// Wraps already base64-encoded JPEG data. An empty payload is rejected:
    /// the identification service cannot do anything with a blank frame.
    pub fn from_base64(
        data: impl Into<String>,
        purpose: ImagePurpose,
    ) -> Result<Self, CaptureError> {
        let data = data.into();
        if data.trim().is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(Self { data, purpose })
    }

    pub fn from_jpeg_bytes(bytes: &[u8], purpose: ImagePurpose) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(Self {
            data: STANDARD.encode(bytes),
            purpose,
        })
    }

    pub fn base64_data(&self) -> &str {
        &self.data
    }

    pub fn purpose(&self) -> ImagePurpose {
        self.purpose
    }

    /// Re-tags the frame for display in a scan result.
    pub fn into_display(self) -> Self {
        Self {
            purpose: ImagePurpose::Display,
            ..self
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("captured frame contained no image bytes")]
    EmptyFrame,
    #[error("capture device error: {0}")]
    Device(String),
}

/// External capture collaborator. Implementations hand out JPEG frames at
/// roughly 0.8 quality. A source that cannot acquire a device reports
/// `has_live_capture() == false` rather than erroring; the orchestrator then
/// runs the attempt in demo mode.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    fn has_live_capture(&self) -> bool;

    async fn capture_frame(&self) -> Result<CapturedImage, CaptureError>;
}
