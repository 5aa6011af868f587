use crate::handles::ResourceId;

/// Errors reported by a [`RenderDevice`](crate::RenderDevice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A shader, pixel or vertex format has no mapping on this backend.
    UnsupportedFormat(String),

    /// The handle was never created by this device, or was destroyed.
    InvalidHandle(ResourceId),

    /// A buffer or texture write falls outside the resource.
    OutOfBounds { offset: u64, len: u64, capacity: u64 },

    /// Requested texture exceeds the device limit.
    TextureTooLarge { width: u32, height: u32, max: u32 },

    /// The command list was misused, e.g. recorded into after it was closed.
    CommandList(String),

    /// The backend rejected a submitted command list.
    SubmitFailed(String),

    /// No suitable adapter could be found.
    NoAdapter(String),

    /// Any other backend failure.
    Backend(String),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::UnsupportedFormat(what) => write!(f, "Unsupported format: {}", what),
            DeviceError::InvalidHandle(id) => write!(f, "Invalid or destroyed handle: {}", id),
            DeviceError::OutOfBounds {
                offset,
                len,
                capacity,
            } => write!(
                f,
                "Write of {} bytes at offset {} exceeds capacity {}",
                len, offset, capacity
            ),
            DeviceError::TextureTooLarge { width, height, max } => write!(
                f,
                "Texture {}x{} exceeds the device limit of {}",
                width, height, max
            ),
            DeviceError::CommandList(msg) => write!(f, "Command list error: {}", msg),
            DeviceError::SubmitFailed(msg) => write!(f, "Submission failed: {}", msg),
            DeviceError::NoAdapter(msg) => write!(f, "No suitable GPU adapter: {}", msg),
            DeviceError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
