//! wgpu render backend for the terrain viewer.
//!
//! Draws the grid as one indexed triangle strip through a fog-and-distance
//! program loaded from two WGSL files.
//!
//! # Invariants
//! - The grid buffers are static: uploaded once per build, never written
//!   per frame.
//! - A failed shader reload leaves the previous program in place.
//! - Uniforms missing from the program are skipped, never fatal.
//! - Backend errors are polled after each frame and only logged.

mod context;
mod error;
mod gpu;
mod interface;
mod program;
mod uniforms;

pub use context::GraphicsContext;
pub use error::{BindingError, GpuError, ShaderError};
pub use gpu::{FrameParams, TerrainRenderer};
pub use interface::{AttributeLocation, ProgramInterface, ShaderSources, UniformLocation};
pub use program::ShaderProgram;
pub use uniforms::{SceneBindings, SceneUniforms, UniformBlock};

/// Fragment output the terrain program must write at location 0.
pub const OUTPUT_NAME: &str = "out_color";
