//! Backend-independent types shared by the neutral runtime and every
//! backend crate: error types, bitflags, pixel formats, device limits,
//! object handles, and resource/pipeline descriptors.
//!
//! Nothing in here depends on a concrete backend, so a backend crate and
//! `nyxgfx-core` both depend on it without depending on each other.

mod debug;
mod descriptors;
mod error;
mod flags;
mod formats;
mod handle;
mod limits;

pub use debug::{Label, SetLabel};
pub use descriptors::*;
pub use error::{Error, ErrorKind, Result};
pub use flags::{BackendBits, BufferUsage, ColorWriteMask, ShaderStageFlags, TextureUsage};
pub use formats::{IndexFormat, TextureFormat, VertexFormat};
pub use handle::{
    BufferId, ComputePipelineId, FenceId, GraphicsPipelineId, SamplerId, ShaderId, SwapchainId,
    TextureId, TransferBufferId,
};
pub use limits::{
    DeviceLimits, MAX_BINDING_SLOTS, MAX_COLOR_TARGETS, MAX_NATIVE_BUFFERS, MAX_UNIFORM_SLOTS,
    MAX_VERTEX_BUFFERS,
};

/// A commonly-used re-export bundle: a single glob import covering the
/// types an application typically names directly.
pub mod prelude {
    pub use crate::debug::Label;
    pub use crate::descriptors::*;
    pub use crate::flags::{BackendBits, BufferUsage, ColorWriteMask, ShaderStageFlags, TextureUsage};
    pub use crate::formats::{IndexFormat, TextureFormat, VertexFormat};
}
