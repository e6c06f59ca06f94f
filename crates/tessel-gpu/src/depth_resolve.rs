//! Shader-driven depth resolve
//!
//! Depth textures cannot be resolved by a render pass resolve target, and a
//! multisampled texture cannot be a copy source. The resolver renders a
//! full-screen triangle strip into the destination's depth attachment and
//! writes the source depth from the fragment shader. Single-sampled sources
//! go through the same pass with a non-multisampled shader variant, so all
//! depth captures share one path.
//!
//! The source is bound as an unfilterable float texture rather than a depth
//! texture. `textureLoad` on depth bindings has no GLSL translation, so the
//! pipelines use an explicit layout that the GL backend can express.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::enums::{
    CompareFunction, CullMode, FrontFace, LoadOp, PrimitiveTopology, StoreOp, TextureFormat,
    TextureSampleType,
};
use crate::error::{GpuError, GpuResult};
use crate::hal::{
    BindGroupEntry, BindGroupLayoutEntry, BindingResource, BindingType, DepthAttachment,
    DepthStencilState, DrawCall, GpuBackend, PipelineLayout, RenderPassDescriptor,
    RenderPipelineDescriptor, RenderPipelineId, ShaderModuleId, TextureViewDescriptor,
};
use crate::texture::GpuTextureResource;

const VERTEX_STAGE: &str = r#"
var<private> corners: array<vec2<f32>, 4> = array<vec2<f32>, 4>(
    vec2<f32>(-1.0, 1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0)
);

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(corners[index], 0.0, 1.0);
}
"#;

const MULTISAMPLED_FRAGMENT: &str = r#"
@group(0) @binding(0) var src_depth: texture_multisampled_2d<f32>;

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @builtin(frag_depth) f32 {
    return textureLoad(src_depth, vec2<i32>(position.xy), 0).x;
}
"#;

const SINGLE_SAMPLED_FRAGMENT: &str = r#"
@group(0) @binding(0) var src_depth: texture_2d<f32>;

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @builtin(frag_depth) f32 {
    return textureLoad(src_depth, vec2<i32>(position.xy), 0).x;
}
"#;

#[derive(Debug, Default)]
struct ShaderVariant {
    module: Option<ShaderModuleId>,
    /// Keyed by depth format only; one pipeline serves every mip level and layer
    pipelines: HashMap<TextureFormat, RenderPipelineId>,
}

#[derive(Debug, Default)]
pub struct MultisampleDepthResolver {
    multisampled: ShaderVariant,
    single_sampled: ShaderVariant,
}

impl MultisampleDepthResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached pipeline for multisampled sources of `format`
    pub fn cached_pipeline(&self, format: TextureFormat) -> Option<RenderPipelineId> {
        self.multisampled.pipelines.get(&format).copied()
    }

    /// Number of cached pipelines across both shader variants
    pub fn cache_len(&self) -> usize {
        self.multisampled.pipelines.len() + self.single_sampled.pipelines.len()
    }

    /// Pipeline for sources with `format`, built on first use
    pub fn pipeline(
        &mut self,
        gpu: &mut dyn GpuBackend,
        format: TextureFormat,
        multisampled: bool,
    ) -> GpuResult<RenderPipelineId> {
        if !format.is_depth() {
            return Err(GpuError::InvalidDescriptor(format!(
                "depth resolve needs a depth format, got {}",
                format
            )));
        }
        let (variant, fragment, label) = if multisampled {
            (&mut self.multisampled, MULTISAMPLED_FRAGMENT, "multisampled depth resolve")
        } else {
            (&mut self.single_sampled, SINGLE_SAMPLED_FRAGMENT, "depth copy")
        };
        if let Some(pipeline) = variant.pipelines.get(&format) {
            return Ok(*pipeline);
        }

        let shader = match variant.module {
            Some(module) => module,
            None => {
                let source = format!("{}{}", VERTEX_STAGE, fragment);
                let module = gpu.create_shader_module(label, &source)?;
                variant.module = Some(module);
                module
            }
        };
        let source = BindGroupLayoutEntry::fragment(
            0,
            BindingType::texture_2d(TextureSampleType::UnfilterableFloat, multisampled),
        );
        let pipeline = gpu.create_render_pipeline(&RenderPipelineDescriptor {
            label: format!("{} {}", label, format),
            layout: PipelineLayout::Explicit(vec![vec![source]]),
            shader,
            vertex_entry: "vs_main".to_string(),
            fragment_entry: Some("fs_main".to_string()),
            vertex_buffers: Vec::new(),
            color_targets: Vec::new(),
            depth_stencil: Some(DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Always,
            }),
            topology: PrimitiveTopology::TriangleStrip,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            sample_count: 1,
        })?;
        debug!(target: "tessel::pass", format = %format, multisampled, "built depth resolve pipeline");
        variant.pipelines.insert(format, pipeline);
        Ok(pipeline)
    }

    /// Write depth of `src` at (`mip_level`, `layer`) into the same
    /// sub-resource of `dst`.
    pub fn copy_texture(
        &mut self,
        gpu: &mut dyn GpuBackend,
        src: &GpuTextureResource,
        dst: &GpuTextureResource,
        mip_level: u32,
        layer: u32,
    ) -> GpuResult<()> {
        src.ensure_alive()?;
        dst.ensure_alive()?;
        if src.format() != dst.format() {
            return Err(GpuError::FormatMismatch {
                texture: dst.label().to_string(),
                expected: dst.format().as_str(),
                actual: src.format().as_str(),
            });
        }

        let pipeline = self.pipeline(gpu, src.format(), src.sample_count() > 1)?;
        let src_view = src.create_sampling_view(gpu, mip_level, layer)?;
        let dst_view = dst.create_view(gpu, &TextureViewDescriptor::single(mip_level, layer))?;
        let bind_group = gpu.create_bind_group(
            pipeline,
            0,
            &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(src_view),
            }],
        )?;

        let encoded = gpu.encode_render_pass(
            &RenderPassDescriptor {
                label: Some(format!("resolve depth {} -> {}", src.label(), dst.label())),
                color_attachments: Vec::new(),
                depth_attachment: Some(DepthAttachment {
                    view: dst_view,
                    load: LoadOp::Clear,
                    clear_value: 1.0,
                    store: StoreOp::Store,
                }),
            },
            &[DrawCall::procedural(pipeline, 4).with_bind_group(0, bind_group)],
        );
        gpu.destroy_bind_group(bind_group)?;
        gpu.destroy_view(src_view)?;
        gpu.destroy_view(dst_view)?;
        encoded?;
        trace!(
            target: "tessel::pass",
            src = src.label(),
            dst = dst.label(),
            mip_level,
            layer,
            "resolved depth"
        );
        Ok(())
    }
}
