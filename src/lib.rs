//! # nyxgfx — a device-neutral GPU command-buffer runtime
//!
//! nyxgfx sits between an application and a native graphics API (Vulkan,
//! with Metal/D3D12-shaped backends left for future crates), exposing a
//! single, backend-neutral command-buffer API: resource containers with
//! automatic cycling, a bump-allocated uniform sub-allocator, a strict
//! render/compute/copy pass state machine, and a submission engine with
//! deferred destruction. See [`nyxgfx_core`] for the runtime itself and
//! [`backend::Backend`](nyxgfx_core::backend::Backend) for the contract a
//! native backend implements.
//!
//! ## Terminology
//!
//! | nyxgfx             | Vulkan                 | Direct3D 12       |
//! | ------------------- | ---------------------- | ------------------ |
//! | device               | device + queue          | device + queue      |
//! | command buffer       | command buffer          | command list        |
//! | fence                | fence                   | fence                |
//! | resource container   | (application-managed)   | (application-managed) |
//! | render pass          | render pass + framebuffer | render target views |
//! | graphics pipeline    | graphics pipeline        | PSO                  |
//! | shader               | shader module            | shader bytecode      |
//! | sampler              | sampler                  | sampler              |
//! | uniform slot         | push descriptor (dynamic offset) | root CBV          |
//!
//! ## Picking a backend
//!
//! [`create_device`] probes the backends compiled into this build, in the
//! order passed, and returns the first one that can be constructed. Most
//! applications only need one backend compiled in and can call
//! [`Device::new`](nyxgfx_core::Device::new) directly with it; `create_device`
//! exists for callers that want to fall back across backends (spec §6
//! `create_device`'s backend-probing step).
pub use nyxgfx_base as base;
pub use nyxgfx_common as common;
pub use nyxgfx_core as core;

/// One backend per target API compiled into this build.
pub mod backends {
    #[cfg(feature = "vulkan")]
    pub use nyxgfx_vulkan as vulkan;
}

/// A commonly-used re-export bundle, mirroring the base crate's own
/// `prelude` convention.
pub mod prelude {
    #[doc(no_inline)]
    pub use nyxgfx_base::prelude::*;
    #[doc(no_inline)]
    pub use nyxgfx_core::{Backend, CommandBuffer, Device, Stage};
}

#[cfg(feature = "vulkan")]
/// Constructs a [`nyxgfx_vulkan::VulkanBackend`] and wraps it in a
/// [`Device`](nyxgfx_core::Device), the shape `create_device` falls back
/// across when more than one backend is compiled in.
///
/// # Safety
/// See [`VulkanBackend::new`](nyxgfx_vulkan::VulkanBackend::new): the
/// Vulkan loader must be available on this platform.
pub unsafe fn create_device(debug: bool) -> nyxgfx_base::Result<std::sync::Arc<nyxgfx_core::Device<nyxgfx_vulkan::VulkanBackend>>> {
    let backend = nyxgfx_vulkan::VulkanBackend::new(debug)?;
    Ok(nyxgfx_core::Device::new(backend, debug))
}
