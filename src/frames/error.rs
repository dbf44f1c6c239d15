/// Errors raised while inspecting a movie container.
///
/// These never leave the frame counter: [`super::ContainerScanner`] turns
/// them into [`super::FrameInfo::Unknown`].
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// I/O error, including a truncated container
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container structure cannot be interpreted
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// Container parsed but holds no frames
    #[error("container holds no frames")]
    NoFrames,
}
