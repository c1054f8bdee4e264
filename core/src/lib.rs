//! `nyxgfx-core`: the backend-neutral command-buffer runtime.
//!
//! Generic over a [`backend::Backend`] implementation — `nyxgfx-vulkan` for
//! real hardware, `nyxgfx-null` for deterministic tests — so translation is
//! monomorphized per backend rather than dispatched through a `dyn Trait`
//! (spec §9 "Polymorphism over backends"). [`device::Device`] owns every
//! resource pool and the five concern-based mutexes; [`command_buffer::CommandBuffer`]
//! is the thread-affine recording context acquired from it.
pub mod backend;
pub mod blit;
pub mod command_buffer;
pub mod container;
pub mod device;
pub mod fence;
pub mod pass;
pub mod submission;
pub mod uniform;

pub use backend::Backend;
pub use command_buffer::{CommandBuffer, Stage};
pub use device::Device;
pub use pass::Phase;
