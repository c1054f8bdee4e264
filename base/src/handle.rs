//! Opaque object handles.
//!
//! Backend dispatch here is generic rather than virtual (spec §9,
//! "Polymorphism over backends"), so a handle doesn't need to carry a
//! vtable at all: it is a plain generation-checked index into the device's
//! resource containers. Cloning a handle clones the index, not the object
//! it refers to.

use std::fmt;

/// Defines an opaque handle type backed by a generation-checked index.
macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            /// Constructs a handle from a raw slot index and generation
            /// counter. Only resource containers should call this.
            pub fn from_raw_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            pub fn index(self) -> u32 {
                self.index
            }

            pub fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({}#{})"), self.index, self.generation)
            }
        }
    };
}

define_handle! {
    /// Handle to a device-resident texture.
    TextureId
}
define_handle! {
    /// Handle to a device-resident buffer.
    BufferId
}
define_handle! {
    /// Handle to a staging (transfer) buffer.
    TransferBufferId
}
define_handle! {
    /// Handle to a sampler.
    SamplerId
}
define_handle! {
    /// Handle to a compiled shader module.
    ShaderId
}
define_handle! {
    /// Handle to an immutable graphics pipeline.
    GraphicsPipelineId
}
define_handle! {
    /// Handle to an immutable compute pipeline.
    ComputePipelineId
}
define_handle! {
    /// Handle to a fence drawn from the submission engine's fence pool.
    FenceId
}
define_handle! {
    /// Handle to a per-window swapchain.
    SwapchainId
}
