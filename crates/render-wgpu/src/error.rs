use std::path::PathBuf;

/// Fatal graphics setup failures.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("initial shader program failed: {0}")]
    Shader(#[from] ShaderError),
}

/// Shader program build failures. Never fatal after startup: the previous
/// program stays active.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} failed to compile:\n{log}", path.display())]
    Compile { path: PathBuf, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// A name the renderer asked for is not part of the program interface.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("shader did not contain '{0}' uniform")]
    UniformNotFound(String),
    #[error("shader did not contain '{0}' attribute")]
    AttributeNotFound(String),
}
