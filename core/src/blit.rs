//! Cached pipeline/sampler/shader resources backing the `blit` copy helper
//! (spec §6 `blit`, §4.7 "Blit").
//!
//! A blit is a scaled texture-to-texture copy implemented as a one-triangle
//! full-viewport render pass: a fullscreen vertex shader with no vertex
//! buffer, a single-sampler passthrough fragment shader, and a graphics
//! pipeline keyed by the destination's format (a pipeline's color target
//! format is baked in at creation time, spec §3 "Graphics Pipeline").
use crate::backend::Backend;
use crate::device::Device;
use nyxgfx_base::*;
use std::collections::HashMap;

static BLIT_VERT_SPIRV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/blit.vert.spv"));
static BLIT_FRAG_SPIRV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/blit.frag.spv"));

pub struct BlitResources<B: Backend> {
    vertex_shader: Option<ShaderId>,
    fragment_shader: Option<ShaderId>,
    pipelines: HashMap<TextureFormat, GraphicsPipelineId>,
    nearest_sampler: Option<SamplerId>,
    linear_sampler: Option<SamplerId>,
    _marker: std::marker::PhantomData<B>,
}

impl<B: Backend> Default for BlitResources<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> BlitResources<B> {
    pub fn new() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            pipelines: HashMap::new(),
            nearest_sampler: None,
            linear_sampler: None,
            _marker: std::marker::PhantomData,
        }
    }

    fn vertex_shader(&mut self, device: &Device<B>) -> Result<ShaderId> {
        if let Some(id) = self.vertex_shader {
            return Ok(id);
        }
        let id = device.create_shader(&ShaderDescriptor {
            stage: ShaderStageFlags::VERTEX,
            format: ShaderFormat::Spirv,
            code: BLIT_VERT_SPIRV,
            entry_point: "main",
            label: Some("blit.vert".into()),
        })?;
        self.vertex_shader = Some(id);
        Ok(id)
    }

    fn fragment_shader(&mut self, device: &Device<B>) -> Result<ShaderId> {
        if let Some(id) = self.fragment_shader {
            return Ok(id);
        }
        let id = device.create_shader(&ShaderDescriptor {
            stage: ShaderStageFlags::FRAGMENT,
            format: ShaderFormat::Spirv,
            code: BLIT_FRAG_SPIRV,
            entry_point: "main",
            label: Some("blit.frag".into()),
        })?;
        self.fragment_shader = Some(id);
        Ok(id)
    }

    /// Returns the cached pipeline for `format`, creating it on first use.
    pub(crate) fn pipeline_for(&mut self, device: &Device<B>, format: TextureFormat) -> Result<GraphicsPipelineId> {
        if let Some(id) = self.pipelines.get(&format) {
            return Ok(*id);
        }
        let vs = self.vertex_shader(device)?;
        let fs = self.fragment_shader(device)?;
        let id = device.create_graphics_pipeline(&GraphicsPipelineDescriptor {
            vertex_shader: &vs,
            vertex_entry_point: "main".into(),
            fragment_shader: Some(&fs),
            fragment_entry_point: "main".into(),
            vertex_buffers: Vec::new(),
            color_targets: vec![ColorTargetDescriptor {
                format,
                blend: ColorTargetBlendState::default(),
            }],
            depth_stencil_format: None,
            depth_stencil: DepthStencilState::default(),
            primitive_type: PrimitiveType::TriangleList,
            fill_mode: FillMode::Fill,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            depth_bias: None,
            sample_count: 1,
            sample_mask: 0xFFFF_FFFF,
            blend_constants: [0.0; 4],
            stencil_reference: 0,
            label: Some("blit".into()),
        })?;
        self.pipelines.insert(format, id);
        Ok(id)
    }

    /// Returns the cached nearest/linear sampler, creating it on first use.
    pub(crate) fn sampler_for(&mut self, device: &Device<B>, filter: BlitFilter) -> Result<SamplerId> {
        let slot = match filter {
            BlitFilter::Nearest => &mut self.nearest_sampler,
            BlitFilter::Linear => &mut self.linear_sampler,
        };
        if let Some(id) = *slot {
            return Ok(id);
        }
        let desc = match filter {
            BlitFilter::Nearest => SamplerDescriptor::nearest(),
            BlitFilter::Linear => SamplerDescriptor::linear(),
        };
        let id = device.create_sampler(&desc)?;
        *slot = Some(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyxgfx_null::NullBackend;

    fn device() -> std::sync::Arc<Device<NullBackend>> {
        Device::new(NullBackend::new(), false)
    }

    #[test]
    fn pipeline_is_cached_per_format() {
        let device = device();
        let mut blit = BlitResources::<NullBackend>::new();
        let a = blit.pipeline_for(device.as_ref(), TextureFormat::R8G8B8A8Unorm).unwrap();
        let b = blit.pipeline_for(device.as_ref(), TextureFormat::R8G8B8A8Unorm).unwrap();
        assert_eq!(a, b, "same destination format must reuse the cached pipeline");

        let c = blit.pipeline_for(device.as_ref(), TextureFormat::B8G8R8A8Unorm).unwrap();
        assert_ne!(a, c, "a different destination format needs its own pipeline");
        assert_eq!(blit.pipelines.len(), 2);
    }

    #[test]
    fn sampler_is_cached_per_filter() {
        let device = device();
        let mut blit = BlitResources::<NullBackend>::new();
        let n1 = blit.sampler_for(device.as_ref(), BlitFilter::Nearest).unwrap();
        let n2 = blit.sampler_for(device.as_ref(), BlitFilter::Nearest).unwrap();
        assert_eq!(n1, n2);

        let l = blit.sampler_for(device.as_ref(), BlitFilter::Linear).unwrap();
        assert_ne!(n1, l, "nearest and linear filters must not share a sampler");
    }
}
