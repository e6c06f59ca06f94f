//! WebGPU enumeration registry
//!
//! Every WebGPU string enumeration used by this crate is a closed Rust enum.
//! Each variant knows its wire string (`as_str`), parses back from it
//! (`FromStr`) and serializes through it, so configuration files and traces
//! use the same spelling as WebGPU.

use crate::error::GpuError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// WebGPU wire string of this value
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = GpuError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(GpuError::InvalidDescriptor(format!(
                        "unknown {} value '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    pub enum AddressMode {
        ClampToEdge => "clamp-to-edge",
        Repeat => "repeat",
        MirrorRepeat => "mirror-repeat",
    }
}

wire_enum! {
    pub enum BlendFactor {
        Zero => "zero",
        One => "one",
        Src => "src",
        SrcAlpha => "src-alpha",
        OneMinusSrcAlpha => "one-minus-src-alpha",
    }
}

wire_enum! {
    pub enum BlendOperation {
        Add => "add",
        Max => "max",
    }
}

wire_enum! {
    pub enum BufferBindingType {
        Uniform => "uniform",
        Storage => "storage",
        ReadOnlyStorage => "read-only-storage",
    }
}

wire_enum! {
    pub enum CompareFunction {
        Never => "never",
        Less => "less",
        Equal => "equal",
        LessEqual => "less-equal",
        Greater => "greater",
        NotEqual => "not-equal",
        GreaterEqual => "greater-equal",
        Always => "always",
    }
}

wire_enum! {
    pub enum CullMode {
        None => "none",
        Front => "front",
        Back => "back",
    }
}

wire_enum! {
    pub enum FilterMode {
        Nearest => "nearest",
        Linear => "linear",
    }
}

wire_enum! {
    pub enum FrontFace {
        Ccw => "ccw",
        Cw => "cw",
    }
}

wire_enum! {
    pub enum MipmapFilterMode {
        Nearest => "nearest",
        Linear => "linear",
    }
}

wire_enum! {
    pub enum IndexFormat {
        Uint32 => "uint32",
    }
}

wire_enum! {
    pub enum LoadOp {
        Load => "load",
        Clear => "clear",
    }
}

wire_enum! {
    pub enum PrimitiveTopology {
        PointList => "point-list",
        LineList => "line-list",
        LineStrip => "line-strip",
        TriangleList => "triangle-list",
        TriangleStrip => "triangle-strip",
    }
}

wire_enum! {
    pub enum PowerPreference {
        LowPower => "low-power",
        HighPerformance => "high-performance",
    }
}

wire_enum! {
    pub enum SamplerBindingType {
        Filtering => "filtering",
        NonFiltering => "non-filtering",
        Comparison => "comparison",
    }
}

wire_enum! {
    pub enum StoreOp {
        Store => "store",
        Discard => "discard",
    }
}

wire_enum! {
    pub enum TextureDimension {
        D1 => "1d",
        D2 => "2d",
        D3 => "3d",
    }
}

wire_enum! {
    pub enum TextureFormat {
        R8Unorm => "r8unorm",
        R16Float => "r16float",
        Rg8Unorm => "rg8unorm",
        R32Uint => "r32uint",
        R32Sint => "r32sint",
        R32Float => "r32float",
        Rg16Float => "rg16float",
        Rgba8Unorm => "rgba8unorm",
        Rgba8UnormSrgb => "rgba8unorm-srgb",
        Bgra8Unorm => "bgra8unorm",
        Bgra8UnormSrgb => "bgra8unorm-srgb",
        Rg32Uint => "rg32uint",
        Rg32Sint => "rg32sint",
        Rg32Float => "rg32float",
        Rgba16Float => "rgba16float",
        Rgba32Uint => "rgba32uint",
        Rgba32Sint => "rgba32sint",
        Rgba32Float => "rgba32float",
        Depth16Unorm => "depth16unorm",
        Depth24Plus => "depth24plus",
        Depth24PlusStencil8 => "depth24plus-stencil8",
        Depth32Float => "depth32float",
    }
}

impl TextureFormat {
    /// Size of one texel in bytes, as laid out in CPU upload buffers
    pub const fn pixel_size(self) -> u32 {
        use TextureFormat::*;
        match self {
            R8Unorm => 1,
            R16Float | Rg8Unorm | Depth16Unorm => 2,
            R32Uint | R32Sint | R32Float | Rg16Float | Rgba8Unorm | Rgba8UnormSrgb
            | Bgra8Unorm | Bgra8UnormSrgb | Depth24Plus | Depth24PlusStencil8 | Depth32Float => 4,
            Rg32Uint | Rg32Sint | Rg32Float | Rgba16Float => 8,
            Rgba32Uint | Rgba32Sint | Rgba32Float => 16,
        }
    }

    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth24Plus
                | TextureFormat::Depth24PlusStencil8
                | TextureFormat::Depth32Float
        )
    }

    /// Unsigned or signed integer texels
    pub const fn is_integer(self) -> bool {
        use TextureFormat::*;
        matches!(
            self,
            R32Uint | R32Sint | Rg32Uint | Rg32Sint | Rgba32Uint | Rgba32Sint
        )
    }

    pub const fn has_stencil(self) -> bool {
        matches!(self, TextureFormat::Depth24PlusStencil8)
    }

    /// Whether the format can be bound as a filterable float texture.
    pub const fn is_filterable(self) -> bool {
        use TextureFormat::*;
        matches!(
            self,
            R8Unorm
                | R16Float
                | Rg8Unorm
                | Rg16Float
                | Rgba8Unorm
                | Rgba8UnormSrgb
                | Bgra8Unorm
                | Bgra8UnormSrgb
                | Rgba16Float
        )
    }

    /// Rough bytes-per-texel estimate derived from the wire string.
    ///
    /// Used for memory statistics only; channel count comes from the
    /// `rgba`/`rg`/`r` prefix and component size from the bit width.
    pub fn estimated_bytes_per_px(self) -> u32 {
        let name = self.as_str();
        let channels = if name.contains("rgba") || name.contains("bgra") {
            4
        } else if name.contains("rg") {
            2
        } else {
            1
        };
        if name.contains('8') && !name.contains("stencil8") {
            channels
        } else if name.contains("16") {
            2 * channels
        } else if name.contains("32") {
            4 * channels
        } else {
            4
        }
    }
}

wire_enum! {
    pub enum TextureSampleType {
        Float => "float",
        UnfilterableFloat => "unfilterable-float",
        Depth => "depth",
    }
}

wire_enum! {
    pub enum TextureViewDimension {
        D1 => "1d",
        D2 => "2d",
        D2Array => "2d-array",
        Cube => "cube",
        CubeArray => "cube-array",
        D3 => "3d",
    }
}

wire_enum! {
    pub enum VertexFormat {
        Float32 => "float32",
        Float32x2 => "float32x2",
        Float32x3 => "float32x3",
        Float32x4 => "float32x4",
        Uint32 => "uint32",
        Uint32x2 => "uint32x2",
        Uint32x3 => "uint32x3",
        Uint32x4 => "uint32x4",
        Sint32 => "sint32",
        Sint32x2 => "sint32x2",
        Sint32x3 => "sint32x3",
        Sint32x4 => "sint32x4",
    }
}

impl VertexFormat {
    pub const fn size(self) -> u64 {
        use VertexFormat::*;
        match self {
            Float32 | Uint32 | Sint32 => 4,
            Float32x2 | Uint32x2 | Sint32x2 => 8,
            Float32x3 | Uint32x3 | Sint32x3 => 12,
            Float32x4 | Uint32x4 | Sint32x4 => 16,
        }
    }
}

wire_enum! {
    pub enum VertexStepMode {
        Vertex => "vertex",
        Instance => "instance",
    }
}
