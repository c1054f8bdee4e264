//! Enumerated domains and descriptor structs for resource/pipeline creation.
use crate::flags::{BufferUsage, ColorWriteMask, ShaderStageFlags, TextureUsage};
use crate::formats::{TextureFormat, VertexFormat};

/// Direction of data flow through a [`crate::TransferBufferDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Describes a user-creatable buffer (spec §6 `create_buffer`).
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub usage: BufferUsage,
    pub size: u64,
    pub label: Option<String>,
}

/// Describes a staging buffer used for uploads/downloads (spec §3 "Transfer
/// Buffer").
#[derive(Debug, Clone)]
pub struct TransferBufferDescriptor {
    pub direction: TransferDirection,
    pub size: u64,
    pub label: Option<String>,
}

/// Describes a user-creatable texture (spec §6 `create_texture`).
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub is_cube: bool,
    pub label: Option<String>,
}

impl TextureDescriptor {
    /// A simple 2D, single-mip, single-sample, non-array texture.
    pub fn texture_2d(format: TextureFormat, usage: TextureUsage, width: u32, height: u32) -> Self {
        Self {
            format,
            usage,
            width,
            height,
            depth_or_layers: 1,
            mip_levels: 1,
            sample_count: 1,
            is_cube: false,
            label: None,
        }
    }
}

/// Identifies a single (texture, mip level, layer) slice (spec §3 "Texture
/// Subresource").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSlice {
    pub mip_level: u32,
    pub layer: u32,
}

impl Default for TextureSlice {
    fn default() -> Self {
        Self { mip_level: 0, layer: 0 }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SamplerAddressMode: u8 {
        const REPEAT = 0;
    }
}

/// Texture filtering mode used by a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Mipmap sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapMode {
    Nearest,
    Linear,
}

/// Texture coordinate wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Describes a sampler (spec §6 `create_sampler`).
#[derive(Debug, Clone, Copy)]
pub struct SamplerDescriptor {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub max_anisotropy: u32,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            mipmap_mode: MipmapMode::Nearest,
            address_u: AddressMode::ClampToEdge,
            address_v: AddressMode::ClampToEdge,
            address_w: AddressMode::ClampToEdge,
            max_anisotropy: 1,
        }
    }
}

impl SamplerDescriptor {
    pub fn nearest() -> Self {
        Self::default()
    }

    pub fn linear() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmap_mode: MipmapMode::Linear,
            ..Self::default()
        }
    }
}

/// The binary format a shader's bytecode is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFormat {
    Spirv,
    Hlsl,
    Dxbc,
    Dxil,
    Msl,
    Metallib,
    /// Placeholder reserved for vendor-private formats; never matched by a
    /// compliant backend.
    Secret,
}

/// Describes a shader module (spec §6 `create_shader`).
#[derive(Debug, Clone)]
pub struct ShaderDescriptor<'a> {
    pub stage: ShaderStageFlags,
    pub format: ShaderFormat,
    pub code: &'a [u8],
    pub entry_point: &'a str,
    pub label: Option<String>,
}

/// Primitive topology used by a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

impl PrimitiveType {
    /// Number of vertices consumed for `n` primitives (spec §4.4).
    pub fn vertex_count(self, primitive_count: u32) -> u32 {
        match self {
            PrimitiveType::TriangleList => 3 * primitive_count,
            PrimitiveType::TriangleStrip | PrimitiveType::LineStrip => {
                if primitive_count == 0 {
                    0
                } else {
                    primitive_count + 2
                }
            }
            PrimitiveType::LineList => 2 * primitive_count,
            PrimitiveType::PointList => primitive_count,
        }
    }
}

/// Polygon fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Fill,
    Line,
}

/// Triangle face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Winding order considered front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

/// A comparison function used by depth/stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// An operation performed on the stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Describes one face's stencil test.
#[derive(Debug, Clone, Copy)]
pub struct StencilFaceState {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub compare: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            compare: CompareOp::Always,
            compare_mask: 0xFFFF_FFFF,
            write_mask: 0xFFFF_FFFF,
        }
    }
}

/// Depth/stencil test and write state.
#[derive(Debug, Clone, Copy)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare: CompareOp,
    pub stencil_test_enable: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare: CompareOp::Always,
            stencil_test_enable: false,
            front: StencilFaceState::default(),
            back: StencilFaceState::default(),
        }
    }
}

/// Blend factor operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend combine operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Per-color-target blend state.
#[derive(Debug, Clone, Copy)]
pub struct ColorTargetBlendState {
    pub enabled: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub alpha_op: BlendOp,
    pub write_mask: ColorWriteMask,
}

impl Default for ColorTargetBlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

/// A single color target's static state within a graphics pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ColorTargetDescriptor {
    pub format: TextureFormat,
    pub blend: ColorTargetBlendState,
}

/// Per-vertex-buffer-slot attribute layout.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub stride: u32,
    pub instanced: bool,
    pub attributes: Vec<VertexAttribute>,
}

/// One shader-visible vertex attribute within a [`VertexBufferLayout`].
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

/// Describes a graphics pipeline (spec §6 `create_graphics_pipeline`).
///
/// Immutable after creation (spec §3 "Graphics Pipeline"); the fields here
/// are cached on the pipeline container and re-applied on every bind.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDescriptor<'a> {
    pub vertex_shader: &'a crate::handle::ShaderId,
    pub vertex_entry_point: String,
    pub fragment_shader: Option<&'a crate::handle::ShaderId>,
    pub fragment_entry_point: String,
    pub vertex_buffers: Vec<VertexBufferLayout>,
    pub color_targets: Vec<ColorTargetDescriptor>,
    pub depth_stencil_format: Option<TextureFormat>,
    pub depth_stencil: DepthStencilState,
    pub primitive_type: PrimitiveType,
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias: Option<DepthBias>,
    pub sample_count: u32,
    pub sample_mask: u32,
    pub blend_constants: [f32; 4],
    pub stencil_reference: u32,
    pub label: Option<String>,
}

/// Static depth bias parameters; cached on the pipeline and re-applied on
/// bind (spec §3 "Graphics Pipeline").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub constant_factor: f32,
    pub clamp: f32,
    pub slope_factor: f32,
}

/// Describes a compute pipeline (spec §6 `create_compute_pipeline`).
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor<'a> {
    pub shader: &'a crate::handle::ShaderId,
    pub entry_point: String,
    pub threadgroup_size: [u32; 3],
    pub label: Option<String>,
}

/// Action taken with an attachment's contents at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// Action taken with an attachment's contents at the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// An RGBA clear color, as four floats in `[0, 1]`.
pub type ClearColor = [f32; 4];

/// Mode used when presenting a swapchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Vsync,
    Immediate,
    Mailbox,
}

/// Color space / HDR composition mode for a swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapchainComposition {
    Sdr,
    SdrLinear,
    HdrExtendedLinear,
    Hdr10St2048,
}

/// Minification filter used when blitting between textures of different
/// sizes (spec §6 `blit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitFilter {
    Nearest,
    Linear,
}

pub use crate::formats::IndexFormat as IndexElementFormat;
