//! Texture format table and pure conversion helpers.
//!
//! These are backend-neutral facts about formats (texel size, whether a
//! format carries a depth and/or stencil component). Translating a
//! [`TextureFormat`] to a backend-native format enum is the backend's job
//! (spec §4.7); this module only expresses the facts every backend agrees on.

/// A backend-neutral texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TextureFormat {
    A8Unorm,
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8Uint,
    R8G8Sint,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    R8G8B8A8Snorm,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    R16Unorm,
    R16Snorm,
    R16Uint,
    R16Sint,
    R16Float,
    R16G16Unorm,
    R16G16Float,
    R16G16B16A16Unorm,
    R16G16B16A16Float,
    R32Uint,
    R32Sint,
    R32Float,
    R32G32Float,
    R32G32B32A32Float,
    R10G10B10A2Unorm,
    R11G11B10Float,
    Bc1RgbaUnorm,
    Bc1RgbaUnormSrgb,
    Bc2RgbaUnorm,
    Bc2RgbaUnormSrgb,
    Bc3RgbaUnorm,
    Bc3RgbaUnormSrgb,
    Bc4RUnorm,
    Bc4RSnorm,
    Bc5RgUnorm,
    Bc5RgSnorm,
    Bc6hRgbFloat,
    Bc6hRgbUfloat,
    Bc7RgbaUnorm,
    Bc7RgbaUnormSrgb,
    D16Unorm,
    D32Float,
    D24UnormS8Uint,
    D32FloatS8Uint,
}

impl TextureFormat {
    /// The number of bytes occupied by one texel block of this format.
    ///
    /// For block-compressed formats this is the number of bytes per 4x4
    /// block, not per texel.
    pub fn texel_block_size(self) -> u32 {
        use TextureFormat::*;
        match self {
            A8Unorm | R8Unorm | R8Snorm | R8Uint | R8Sint => 1,
            R8G8Unorm | R8G8Snorm | R8G8Uint | R8G8Sint | R16Unorm | R16Snorm | R16Uint
            | R16Sint | R16Float | D16Unorm => 2,
            R8G8B8A8Unorm | R8G8B8A8UnormSrgb | R8G8B8A8Snorm | R8G8B8A8Uint | R8G8B8A8Sint
            | B8G8R8A8Unorm | B8G8R8A8UnormSrgb | R16G16Unorm | R16G16Float | R32Uint
            | R32Sint | R32Float | R10G10B10A2Unorm | R11G11B10Float | D32Float
            | D24UnormS8Uint => 4,
            D32FloatS8Uint => 8,
            R16G16B16A16Unorm | R16G16B16A16Float | R32G32Float => 8,
            R32G32B32A32Float => 16,
            Bc1RgbaUnorm | Bc1RgbaUnormSrgb | Bc4RUnorm | Bc4RSnorm => 8,
            Bc2RgbaUnorm | Bc2RgbaUnormSrgb | Bc3RgbaUnorm | Bc3RgbaUnormSrgb | Bc5RgUnorm
            | Bc5RgSnorm | Bc6hRgbFloat | Bc6hRgbUfloat | Bc7RgbaUnorm | Bc7RgbaUnormSrgb => 16,
        }
    }

    /// `true` if the format carries a depth component.
    pub fn has_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::D16Unorm
                | TextureFormat::D32Float
                | TextureFormat::D24UnormS8Uint
                | TextureFormat::D32FloatS8Uint
        )
    }

    /// `true` if the format carries a stencil component.
    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            TextureFormat::D24UnormS8Uint | TextureFormat::D32FloatS8Uint
        )
    }

    /// `true` if this is a block-compressed format.
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            TextureFormat::Bc1RgbaUnorm
                | TextureFormat::Bc1RgbaUnormSrgb
                | TextureFormat::Bc2RgbaUnorm
                | TextureFormat::Bc2RgbaUnormSrgb
                | TextureFormat::Bc3RgbaUnorm
                | TextureFormat::Bc3RgbaUnormSrgb
                | TextureFormat::Bc4RUnorm
                | TextureFormat::Bc4RSnorm
                | TextureFormat::Bc5RgUnorm
                | TextureFormat::Bc5RgSnorm
                | TextureFormat::Bc6hRgbFloat
                | TextureFormat::Bc6hRgbUfloat
                | TextureFormat::Bc7RgbaUnorm
                | TextureFormat::Bc7RgbaUnormSrgb
        )
    }

    /// The edge length, in texels, of one compression block (1 for
    /// uncompressed formats).
    pub fn block_dim(self) -> u32 {
        if self.is_compressed() {
            4
        } else {
            1
        }
    }
}

/// The element size used by an index buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    /// Size, in bytes, of a single index element (spec §4.4).
    pub fn element_size(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// The data layout of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VertexFormat {
    Float1,
    Float2,
    Float3,
    Float4,
    UByte4Norm,
    Short2,
    Short2Norm,
    Short4,
    Short4Norm,
    Uint1,
    Uint2,
    Uint4,
}

impl VertexFormat {
    /// Size in bytes of one element of this format.
    pub fn size(self) -> u32 {
        use VertexFormat::*;
        match self {
            UByte4Norm => 4,
            Short2 | Short2Norm => 4,
            Short4 | Short4Norm => 8,
            Float1 | Uint1 => 4,
            Float2 | Uint2 => 8,
            Float3 => 12,
            Float4 | Uint4 => 16,
        }
    }
}
