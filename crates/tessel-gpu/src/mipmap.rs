//! Mip level generation
//!
//! [`BlitMipmapGenerator`] downsamples level `n - 1` into level `n` with one
//! render pass per level and layer, drawing a full-screen triangle strip with
//! a linear sampler.

use std::collections::HashMap;

use tracing::{debug, warn};
use wgpu::TextureUsages;

use crate::enums::{
    CullMode, FilterMode, FrontFace, LoadOp, MipmapFilterMode, PrimitiveTopology,
    SamplerBindingType, StoreOp, TextureDimension, TextureFormat, TextureSampleType,
};
use crate::error::GpuResult;
use crate::hal::{
    BindGroupEntry, BindGroupLayoutEntry, BindingResource, BindingType, ColorAttachment,
    ColorTargetState, DrawCall, GpuBackend, PipelineLayout, RenderPassDescriptor,
    RenderPipelineDescriptor, RenderPipelineId, SamplerDescriptor, SamplerId, ShaderModuleId,
    TextureViewDescriptor,
};
use crate::texture::GpuTextureResource;

/// Fills mip levels `1..n` of a texture whose level 0 is populated
pub trait MipmapGenerator {
    fn generate_mip_levels(
        &mut self,
        gpu: &mut dyn GpuBackend,
        texture: &GpuTextureResource,
    ) -> GpuResult<()>;
}

const BLIT_SHADER: &str = r#"
var<private> corners: array<vec2<f32>, 4> = array<vec2<f32>, 4>(
    vec2<f32>(-1.0, 1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0)
);

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var out: VertexOutput;
    out.uv = corners[index] * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5);
    out.position = vec4<f32>(corners[index], 0.0, 1.0);
    return out;
}

@group(0) @binding(0) var src_level: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_level, src_sampler, in.uv);
}
"#;

/// Render-based downsampler with one pipeline per colour format
#[derive(Debug, Default)]
pub struct BlitMipmapGenerator {
    shader: Option<ShaderModuleId>,
    sampler: Option<SamplerId>,
    pipelines: HashMap<TextureFormat, RenderPipelineId>,
}

impl BlitMipmapGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn sampler(&mut self, gpu: &mut dyn GpuBackend) -> GpuResult<SamplerId> {
        if let Some(sampler) = self.sampler {
            return Ok(sampler);
        }
        let sampler = gpu.create_sampler(&SamplerDescriptor {
            label: Some("mipmap blit sampler".to_string()),
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Nearest,
            ..Default::default()
        })?;
        self.sampler = Some(sampler);
        Ok(sampler)
    }

    fn pipeline(
        &mut self,
        gpu: &mut dyn GpuBackend,
        format: TextureFormat,
    ) -> GpuResult<RenderPipelineId> {
        if let Some(pipeline) = self.pipelines.get(&format) {
            return Ok(*pipeline);
        }
        let shader = match self.shader {
            Some(shader) => shader,
            None => {
                let shader = gpu.create_shader_module("mipmap blit", BLIT_SHADER)?;
                self.shader = Some(shader);
                shader
            }
        };
        let layout = PipelineLayout::Explicit(vec![vec![
            BindGroupLayoutEntry::fragment(
                0,
                BindingType::texture_2d(TextureSampleType::Float, false),
            ),
            BindGroupLayoutEntry::fragment(1, BindingType::Sampler(SamplerBindingType::Filtering)),
        ]]);
        let pipeline = gpu.create_render_pipeline(&RenderPipelineDescriptor {
            label: format!("mipmap blit {}", format),
            layout,
            shader,
            vertex_entry: "vs_main".to_string(),
            fragment_entry: Some("fs_main".to_string()),
            vertex_buffers: Vec::new(),
            color_targets: vec![ColorTargetState { format, blend: None }],
            depth_stencil: None,
            topology: PrimitiveTopology::TriangleStrip,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            sample_count: 1,
        })?;
        debug!(target: "tessel::texture", format = %format, "built mipmap pipeline");
        self.pipelines.insert(format, pipeline);
        Ok(pipeline)
    }
}

impl MipmapGenerator for BlitMipmapGenerator {
    fn generate_mip_levels(
        &mut self,
        gpu: &mut dyn GpuBackend,
        texture: &GpuTextureResource,
    ) -> GpuResult<()> {
        texture.ensure_alive()?;
        let desc = texture.descriptor();
        if desc.mip_level_count < 2 {
            return Ok(());
        }
        if desc.dimension != TextureDimension::D2 {
            debug!(
                target: "tessel::texture",
                label = texture.label(),
                dimension = %desc.dimension,
                "skipping mip generation for non-2D texture"
            );
            return Ok(());
        }
        let required = TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING;
        if !desc.format.is_filterable() || !desc.usage.contains(required) {
            warn!(
                target: "tessel::texture",
                label = texture.label(),
                format = %desc.format,
                "texture cannot be downsampled by rendering, mip levels left empty"
            );
            return Ok(());
        }

        let pipeline = self.pipeline(gpu, desc.format)?;
        let sampler = self.sampler(gpu)?;
        let layers = desc.size.depth_or_array_layers;

        for layer in 0..layers {
            for level in 1..desc.mip_level_count {
                let src = texture.create_view(gpu, &TextureViewDescriptor::single(level - 1, layer))?;
                let dst = texture.create_view(gpu, &TextureViewDescriptor::single(level, layer))?;
                let bind_group = gpu.create_bind_group(
                    pipeline,
                    0,
                    &[
                        BindGroupEntry {
                            binding: 0,
                            resource: BindingResource::TextureView(src),
                        },
                        BindGroupEntry {
                            binding: 1,
                            resource: BindingResource::Sampler(sampler),
                        },
                    ],
                )?;
                let encoded = gpu.encode_render_pass(
                    &RenderPassDescriptor {
                        label: Some(format!("{} mip {} layer {}", texture.label(), level, layer)),
                        color_attachments: vec![ColorAttachment {
                            view: dst,
                            resolve_target: None,
                            load: LoadOp::Clear,
                            clear_value: None,
                            store: StoreOp::Store,
                        }],
                        depth_attachment: None,
                    },
                    &[DrawCall::procedural(pipeline, 4).with_bind_group(0, bind_group)],
                );
                gpu.destroy_bind_group(bind_group)?;
                gpu.destroy_view(src)?;
                gpu.destroy_view(dst)?;
                encoded?;
            }
        }
        debug!(
            target: "tessel::texture",
            label = texture.label(),
            levels = desc.mip_level_count,
            layers,
            "generated mip levels"
        );
        Ok(())
    }
}
