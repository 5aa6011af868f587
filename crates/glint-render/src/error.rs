use glint_device::DeviceError;

/// Misuse of the renderer API. These are programming errors and are not
/// meant to be recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A frame or draw call was issued before `initialize`.
    NotInitialized,

    /// `initialize` was called twice.
    AlreadyInitialized,

    /// A draw or flush was issued outside `begin_frame`/`end_frame`.
    NotRecording,

    /// `begin_frame` was called while a frame was already open.
    FrameInProgress,

    /// The renderer was used after `dispose`.
    Disposed,

    /// A non-zero rotation was requested in a coordinate system without a
    /// stable origin.
    RotationUnsupported,

    /// A coordinate system name or discriminant that does not exist.
    UnknownCoordinateSystem(String),

    /// Batch capacity outside `1..=MAX_BATCH_CAPACITY`.
    InvalidCapacity(usize),
}

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageError::NotInitialized => write!(f, "renderer used before initialize()"),
            UsageError::AlreadyInitialized => write!(f, "initialize() called twice"),
            UsageError::NotRecording => {
                write!(f, "draw issued outside begin_frame()/end_frame()")
            }
            UsageError::FrameInProgress => {
                write!(f, "begin_frame() called while a frame is in progress")
            }
            UsageError::Disposed => write!(f, "renderer used after dispose()"),
            UsageError::RotationUnsupported => write!(
                f,
                "rotations can only be applied with absolute or relative coordinates"
            ),
            UsageError::UnknownCoordinateSystem(name) => {
                write!(f, "unknown coordinate system: {}", name)
            }
            UsageError::InvalidCapacity(capacity) => write!(
                f,
                "batch capacity {} is outside 1..={}",
                capacity,
                crate::MAX_BATCH_CAPACITY
            ),
        }
    }
}

impl std::error::Error for UsageError {}

/// Errors that can occur while rendering sprites.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// API misuse. Fatal.
    Usage(UsageError),

    /// A shader or pixel format has no mapping for the active backend.
    /// Reported at setup time.
    UnsupportedFormat(String),

    /// A configured resource limit was exceeded. The caller may recover by
    /// drawing less.
    ResourceExhausted(String),

    /// The device failed to create a resource or execute a submission.
    Backend(DeviceError),
}

impl RenderError {
    /// Whether the caller can reasonably continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::ResourceExhausted(_))
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Usage(err) => write!(f, "Usage error: {}", err),
            RenderError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            RenderError::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            RenderError::Backend(err) => write!(f, "Backend operation failed: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Usage(err) => Some(err),
            RenderError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UsageError> for RenderError {
    fn from(err: UsageError) -> Self {
        RenderError::Usage(err)
    }
}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::UnsupportedFormat(msg) => RenderError::UnsupportedFormat(msg),
            other => RenderError::Backend(other),
        }
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_format_error_maps_to_unsupported() {
        let err: RenderError = DeviceError::UnsupportedFormat("SpirV".into()).into();
        assert_eq!(err, RenderError::UnsupportedFormat("SpirV".into()));
    }

    #[test]
    fn test_only_exhaustion_is_recoverable() {
        assert!(RenderError::ResourceExhausted("vertices".into()).is_recoverable());
        assert!(!RenderError::Usage(UsageError::NotInitialized).is_recoverable());
        assert!(!RenderError::Backend(DeviceError::SubmitFailed("lost".into())).is_recoverable());
    }
}
