//! `TextureFormat`/`VertexFormat` <-> `vk::Format` translation tables (spec
//! §4.7's backend translation contract: this table is the concrete
//! instance of it for Vulkan), one match arm per format.
use ash::vk;
use nyxgfx_base::{TextureFormat, VertexFormat};

pub fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    use TextureFormat::*;
    match format {
        A8Unorm => vk::Format::R8_UNORM,
        R8Unorm => vk::Format::R8_UNORM,
        R8Snorm => vk::Format::R8_SNORM,
        R8Uint => vk::Format::R8_UINT,
        R8Sint => vk::Format::R8_SINT,
        R8G8Unorm => vk::Format::R8G8_UNORM,
        R8G8Snorm => vk::Format::R8G8_SNORM,
        R8G8Uint => vk::Format::R8G8_UINT,
        R8G8Sint => vk::Format::R8G8_SINT,
        R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
        R8G8B8A8UnormSrgb => vk::Format::R8G8B8A8_SRGB,
        R8G8B8A8Snorm => vk::Format::R8G8B8A8_SNORM,
        R8G8B8A8Uint => vk::Format::R8G8B8A8_UINT,
        R8G8B8A8Sint => vk::Format::R8G8B8A8_SINT,
        B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
        B8G8R8A8UnormSrgb => vk::Format::B8G8R8A8_SRGB,
        R16Unorm => vk::Format::R16_UNORM,
        R16Snorm => vk::Format::R16_SNORM,
        R16Uint => vk::Format::R16_UINT,
        R16Sint => vk::Format::R16_SINT,
        R16Float => vk::Format::R16_SFLOAT,
        R16G16Unorm => vk::Format::R16G16_UNORM,
        R16G16Float => vk::Format::R16G16_SFLOAT,
        R16G16B16A16Unorm => vk::Format::R16G16B16A16_UNORM,
        R16G16B16A16Float => vk::Format::R16G16B16A16_SFLOAT,
        R32Uint => vk::Format::R32_UINT,
        R32Sint => vk::Format::R32_SINT,
        R32Float => vk::Format::R32_SFLOAT,
        R32G32Float => vk::Format::R32G32_SFLOAT,
        R32G32B32A32Float => vk::Format::R32G32B32A32_SFLOAT,
        R10G10B10A2Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
        R11G11B10Float => vk::Format::B10G11R11_UFLOAT_PACK32,
        Bc1RgbaUnorm => vk::Format::BC1_RGBA_UNORM_BLOCK,
        Bc1RgbaUnormSrgb => vk::Format::BC1_RGBA_SRGB_BLOCK,
        Bc2RgbaUnorm => vk::Format::BC2_UNORM_BLOCK,
        Bc2RgbaUnormSrgb => vk::Format::BC2_SRGB_BLOCK,
        Bc3RgbaUnorm => vk::Format::BC3_UNORM_BLOCK,
        Bc3RgbaUnormSrgb => vk::Format::BC3_SRGB_BLOCK,
        Bc4RUnorm => vk::Format::BC4_UNORM_BLOCK,
        Bc4RSnorm => vk::Format::BC4_SNORM_BLOCK,
        Bc5RgUnorm => vk::Format::BC5_UNORM_BLOCK,
        Bc5RgSnorm => vk::Format::BC5_SNORM_BLOCK,
        Bc6hRgbFloat => vk::Format::BC6H_SFLOAT_BLOCK,
        Bc6hRgbUfloat => vk::Format::BC6H_UFLOAT_BLOCK,
        Bc7RgbaUnorm => vk::Format::BC7_UNORM_BLOCK,
        Bc7RgbaUnormSrgb => vk::Format::BC7_SRGB_BLOCK,
        D16Unorm => vk::Format::D16_UNORM,
        D32Float => vk::Format::D32_SFLOAT,
        D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
        D32FloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// `None` for a `vk::Format` with no counterpart in the neutral domain (the
/// reverse direction is only needed for reading back a swapchain's surface
/// format, which is always one the neutral domain already covers).
pub fn vk_to_texture_format(format: vk::Format) -> Option<TextureFormat> {
    use TextureFormat::*;
    Some(match format {
        vk::Format::R8_UNORM => R8Unorm,
        vk::Format::R8_SNORM => R8Snorm,
        vk::Format::R8_UINT => R8Uint,
        vk::Format::R8_SINT => R8Sint,
        vk::Format::R8G8_UNORM => R8G8Unorm,
        vk::Format::R8G8_SNORM => R8G8Snorm,
        vk::Format::R8G8_UINT => R8G8Uint,
        vk::Format::R8G8_SINT => R8G8Sint,
        vk::Format::R8G8B8A8_UNORM => R8G8B8A8Unorm,
        vk::Format::R8G8B8A8_SRGB => R8G8B8A8UnormSrgb,
        vk::Format::R8G8B8A8_SNORM => R8G8B8A8Snorm,
        vk::Format::R8G8B8A8_UINT => R8G8B8A8Uint,
        vk::Format::R8G8B8A8_SINT => R8G8B8A8Sint,
        vk::Format::B8G8R8A8_UNORM => B8G8R8A8Unorm,
        vk::Format::B8G8R8A8_SRGB => B8G8R8A8UnormSrgb,
        vk::Format::R16_UNORM => R16Unorm,
        vk::Format::R16_SFLOAT => R16Float,
        vk::Format::R16G16B16A16_SFLOAT => R16G16B16A16Float,
        vk::Format::R32G32B32A32_SFLOAT => R32G32B32A32Float,
        vk::Format::D16_UNORM => D16Unorm,
        vk::Format::D32_SFLOAT => D32Float,
        vk::Format::D24_UNORM_S8_UINT => D24UnormS8Uint,
        vk::Format::D32_SFLOAT_S8_UINT => D32FloatS8Uint,
        _ => return None,
    })
}

pub fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    use VertexFormat::*;
    match format {
        Float1 => vk::Format::R32_SFLOAT,
        Float2 => vk::Format::R32G32_SFLOAT,
        Float3 => vk::Format::R32G32B32_SFLOAT,
        Float4 => vk::Format::R32G32B32A32_SFLOAT,
        UByte4Norm => vk::Format::R8G8B8A8_UNORM,
        Short2 => vk::Format::R16G16_SINT,
        Short2Norm => vk::Format::R16G16_SNORM,
        Short4 => vk::Format::R16G16B16A16_SINT,
        Short4Norm => vk::Format::R16G16B16A16_SNORM,
        Uint1 => vk::Format::R32_UINT,
        Uint2 => vk::Format::R32G32_UINT,
        Uint4 => vk::Format::R32G32B32A32_UINT,
    }
}
