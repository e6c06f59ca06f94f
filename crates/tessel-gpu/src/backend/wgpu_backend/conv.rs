//! Conversions from canonical descriptors to wgpu types

use crate::enums::{
    AddressMode, BlendFactor, BlendOperation, BufferBindingType, CompareFunction, CullMode,
    FilterMode, FrontFace, IndexFormat, MipmapFilterMode, PrimitiveTopology, SamplerBindingType,
    StoreOp, TextureDimension, TextureFormat, TextureSampleType, TextureViewDimension,
    VertexFormat, VertexStepMode,
};
use crate::hal::{BindGroupLayoutEntry, BindingType, BlendComponent, BlendState, TextureAspect};

pub fn map_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as W;
    match format {
        TextureFormat::R8Unorm => W::R8Unorm,
        TextureFormat::R16Float => W::R16Float,
        TextureFormat::Rg8Unorm => W::Rg8Unorm,
        TextureFormat::R32Uint => W::R32Uint,
        TextureFormat::R32Sint => W::R32Sint,
        TextureFormat::R32Float => W::R32Float,
        TextureFormat::Rg16Float => W::Rg16Float,
        TextureFormat::Rgba8Unorm => W::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => W::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => W::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => W::Bgra8UnormSrgb,
        TextureFormat::Rg32Uint => W::Rg32Uint,
        TextureFormat::Rg32Sint => W::Rg32Sint,
        TextureFormat::Rg32Float => W::Rg32Float,
        TextureFormat::Rgba16Float => W::Rgba16Float,
        TextureFormat::Rgba32Uint => W::Rgba32Uint,
        TextureFormat::Rgba32Sint => W::Rgba32Sint,
        TextureFormat::Rgba32Float => W::Rgba32Float,
        TextureFormat::Depth16Unorm => W::Depth16Unorm,
        TextureFormat::Depth24Plus => W::Depth24Plus,
        TextureFormat::Depth24PlusStencil8 => W::Depth24PlusStencil8,
        TextureFormat::Depth32Float => W::Depth32Float,
    }
}

/// Inverse of [`map_texture_format`] for formats a surface may report
pub fn unmap_texture_format(format: wgpu::TextureFormat) -> Option<TextureFormat> {
    use wgpu::TextureFormat as W;
    Some(match format {
        W::Bgra8Unorm => TextureFormat::Bgra8Unorm,
        W::Bgra8UnormSrgb => TextureFormat::Bgra8UnormSrgb,
        W::Rgba8Unorm => TextureFormat::Rgba8Unorm,
        W::Rgba8UnormSrgb => TextureFormat::Rgba8UnormSrgb,
        W::Rgba16Float => TextureFormat::Rgba16Float,
        _ => return None,
    })
}

pub fn map_texture_dimension(dimension: TextureDimension) -> wgpu::TextureDimension {
    match dimension {
        TextureDimension::D1 => wgpu::TextureDimension::D1,
        TextureDimension::D2 => wgpu::TextureDimension::D2,
        TextureDimension::D3 => wgpu::TextureDimension::D3,
    }
}

pub fn map_view_dimension(dimension: TextureViewDimension) -> wgpu::TextureViewDimension {
    use wgpu::TextureViewDimension as W;
    match dimension {
        TextureViewDimension::D1 => W::D1,
        TextureViewDimension::D2 => W::D2,
        TextureViewDimension::D2Array => W::D2Array,
        TextureViewDimension::Cube => W::Cube,
        TextureViewDimension::CubeArray => W::CubeArray,
        TextureViewDimension::D3 => W::D3,
    }
}

pub fn map_aspect(aspect: TextureAspect) -> wgpu::TextureAspect {
    match aspect {
        TextureAspect::All => wgpu::TextureAspect::All,
        TextureAspect::DepthOnly => wgpu::TextureAspect::DepthOnly,
    }
}

pub fn map_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

pub fn map_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn map_mipmap_filter_mode(mode: MipmapFilterMode) -> wgpu::FilterMode {
    match mode {
        MipmapFilterMode::Nearest => wgpu::FilterMode::Nearest,
        MipmapFilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn map_compare_function(function: CompareFunction) -> wgpu::CompareFunction {
    use wgpu::CompareFunction as W;
    match function {
        CompareFunction::Never => W::Never,
        CompareFunction::Less => W::Less,
        CompareFunction::Equal => W::Equal,
        CompareFunction::LessEqual => W::LessEqual,
        CompareFunction::Greater => W::Greater,
        CompareFunction::NotEqual => W::NotEqual,
        CompareFunction::GreaterEqual => W::GreaterEqual,
        CompareFunction::Always => W::Always,
    }
}

pub fn map_cull_mode(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub fn map_front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Ccw => wgpu::FrontFace::Ccw,
        FrontFace::Cw => wgpu::FrontFace::Cw,
    }
}

pub fn map_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    use wgpu::PrimitiveTopology as W;
    match topology {
        PrimitiveTopology::PointList => W::PointList,
        PrimitiveTopology::LineList => W::LineList,
        PrimitiveTopology::LineStrip => W::LineStrip,
        PrimitiveTopology::TriangleList => W::TriangleList,
        PrimitiveTopology::TriangleStrip => W::TriangleStrip,
    }
}

pub fn map_index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

pub fn map_store_op(op: StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

pub fn map_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as W;
    match format {
        VertexFormat::Float32 => W::Float32,
        VertexFormat::Float32x2 => W::Float32x2,
        VertexFormat::Float32x3 => W::Float32x3,
        VertexFormat::Float32x4 => W::Float32x4,
        VertexFormat::Uint32 => W::Uint32,
        VertexFormat::Uint32x2 => W::Uint32x2,
        VertexFormat::Uint32x3 => W::Uint32x3,
        VertexFormat::Uint32x4 => W::Uint32x4,
        VertexFormat::Sint32 => W::Sint32,
        VertexFormat::Sint32x2 => W::Sint32x2,
        VertexFormat::Sint32x3 => W::Sint32x3,
        VertexFormat::Sint32x4 => W::Sint32x4,
    }
}

pub fn map_step_mode(mode: VertexStepMode) -> wgpu::VertexStepMode {
    match mode {
        VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
        VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
    }
}

fn map_blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::Src => wgpu::BlendFactor::Src,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn map_blend_component(component: BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: map_blend_factor(component.src_factor),
        dst_factor: map_blend_factor(component.dst_factor),
        operation: match component.operation {
            BlendOperation::Add => wgpu::BlendOperation::Add,
            BlendOperation::Max => wgpu::BlendOperation::Max,
        },
    }
}

pub fn map_blend_state(state: BlendState) -> wgpu::BlendState {
    wgpu::BlendState {
        color: map_blend_component(state.color),
        alpha: map_blend_component(state.alpha),
    }
}

pub fn map_sample_type(sample_type: TextureSampleType) -> wgpu::TextureSampleType {
    match sample_type {
        TextureSampleType::Float => wgpu::TextureSampleType::Float { filterable: true },
        TextureSampleType::UnfilterableFloat => wgpu::TextureSampleType::Float { filterable: false },
        TextureSampleType::Depth => wgpu::TextureSampleType::Depth,
    }
}

pub fn map_binding_type(ty: BindingType) -> wgpu::BindingType {
    match ty {
        BindingType::Buffer(ty) => wgpu::BindingType::Buffer {
            ty: match ty {
                BufferBindingType::Uniform => wgpu::BufferBindingType::Uniform,
                BufferBindingType::Storage => wgpu::BufferBindingType::Storage { read_only: false },
                BufferBindingType::ReadOnlyStorage => {
                    wgpu::BufferBindingType::Storage { read_only: true }
                }
            },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        BindingType::Sampler(ty) => wgpu::BindingType::Sampler(match ty {
            SamplerBindingType::Filtering => wgpu::SamplerBindingType::Filtering,
            SamplerBindingType::NonFiltering => wgpu::SamplerBindingType::NonFiltering,
            SamplerBindingType::Comparison => wgpu::SamplerBindingType::Comparison,
        }),
        BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled,
        } => wgpu::BindingType::Texture {
            sample_type: map_sample_type(sample_type),
            view_dimension: map_view_dimension(view_dimension),
            multisampled,
        },
    }
}

pub fn map_layout_entry(entry: &BindGroupLayoutEntry) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: entry.binding,
        visibility: entry.visibility,
        ty: map_binding_type(entry.ty),
        count: None,
    }
}

pub fn map_power_preference(
    preference: crate::enums::PowerPreference,
) -> wgpu::PowerPreference {
    match preference {
        crate::enums::PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        crate::enums::PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_formats_round_trip() {
        for format in [
            TextureFormat::Bgra8Unorm,
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgba8Unorm,
        ] {
            assert_eq!(unmap_texture_format(map_texture_format(format)), Some(format));
        }
        assert_eq!(unmap_texture_format(wgpu::TextureFormat::R8Unorm), None);
    }

    #[test]
    fn test_depth_source_binding_is_unfilterable() {
        let entry = BindGroupLayoutEntry::fragment(
            0,
            BindingType::texture_2d(TextureSampleType::UnfilterableFloat, true),
        );
        assert_eq!(
            map_layout_entry(&entry).ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: true,
            }
        );
    }

    #[test]
    fn test_depth_formats_map_to_depth() {
        for format in TextureFormat::ALL.iter().filter(|f| f.is_depth()) {
            assert!(map_texture_format(*format).is_depth_stencil_format());
        }
    }
}
