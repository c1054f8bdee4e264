//! Usage and capability bit flags.
use bitflags::bitflags;

bitflags! {
    /// Describes the ways a texture may be used.
    ///
    /// Invalid combinations (e.g. `SAMPLER | COLOR_TARGET` alongside
    /// `COMPUTE_STORAGE_WRITE` on hardware that forbids it) are rejected at
    /// texture-creation time with [`ErrorKind::InvalidUsage`](crate::ErrorKind::InvalidUsage).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u8 {
        const SAMPLER               = 0b0000_0001;
        const COLOR_TARGET          = 0b0000_0010;
        const DEPTH_STENCIL_TARGET  = 0b0000_0100;
        const GRAPHICS_STORAGE_READ = 0b0000_1000;
        const COMPUTE_STORAGE_READ  = 0b0001_0000;
        const COMPUTE_STORAGE_WRITE = 0b0010_0000;
    }
}

bitflags! {
    /// Describes the ways a buffer may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u8 {
        const VERTEX                = 0b0000_0001;
        const INDEX                 = 0b0000_0010;
        const INDIRECT               = 0b0000_0100;
        const GRAPHICS_STORAGE_READ  = 0b0000_1000;
        const COMPUTE_STORAGE_READ   = 0b0001_0000;
        const COMPUTE_STORAGE_WRITE  = 0b0010_0000;
    }
}

bitflags! {
    /// Per-component write mask applied to a color target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const RED   = 0b0001;
        const GREEN = 0b0010;
        const BLUE  = 0b0100;
        const ALPHA = 0b1000;
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

bitflags! {
    /// Preferred-backend hint bitmask passed to device creation.
    ///
    /// `ALL` is a hint that the application does not know which backend it
    /// wants; see spec §9's open question on its interpretation. This
    /// implementation treats it as "try every compiled-in backend in an
    /// implementation-defined order", never as a requirement to succeed on
    /// all of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BackendBits: u8 {
        const VULKAN = 0b0001;
        const D3D    = 0b0010;
        const METAL  = 0b0100;
        const ALL = Self::VULKAN.bits() | Self::D3D.bits() | Self::METAL.bits();
    }
}

bitflags! {
    /// Which shader stages an argument or barrier applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u8 {
        const VERTEX  = 0b001;
        const FRAGMENT = 0b010;
        const COMPUTE  = 0b100;
    }
}
