//! CPU-side image payloads and texture topologies
//!
//! Payload constructors validate shape and byte length up front, so the
//! loader only has to match topology against payload shape.

use std::fmt;

use wgpu::Extent3d;

use crate::enums::{TextureDimension, TextureFormat, TextureViewDimension};
use crate::error::{GpuError, GpuResult};
use crate::hal::ImageDataLayout;

/// Shape of a texture as declared by its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTopology {
    D1,
    D2,
    D3,
    Cube,
    Array2d,
    CubeArray,
}

impl TextureTopology {
    pub const fn as_str(self) -> &'static str {
        match self {
            TextureTopology::D1 => "1d",
            TextureTopology::D2 => "2d",
            TextureTopology::D3 => "3d",
            TextureTopology::Cube => "cube",
            TextureTopology::Array2d => "2d-array",
            TextureTopology::CubeArray => "cube-array",
        }
    }

    pub const fn dimension(self) -> TextureDimension {
        match self {
            TextureTopology::D1 => TextureDimension::D1,
            TextureTopology::D3 => TextureDimension::D3,
            _ => TextureDimension::D2,
        }
    }

    pub const fn view_dimension(self) -> TextureViewDimension {
        match self {
            TextureTopology::D1 => TextureViewDimension::D1,
            TextureTopology::D2 => TextureViewDimension::D2,
            TextureTopology::D3 => TextureViewDimension::D3,
            TextureTopology::Cube => TextureViewDimension::Cube,
            TextureTopology::Array2d => TextureViewDimension::D2Array,
            TextureTopology::CubeArray => TextureViewDimension::CubeArray,
        }
    }

    /// 1D and 3D textures cannot be render attachments
    pub const fn is_renderable(self) -> bool {
        !matches!(self, TextureTopology::D1 | TextureTopology::D3)
    }
}

impl fmt::Display for TextureTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw texel data for one image (or one volume)
#[derive(Clone, PartialEq, Eq)]
pub struct BufferedImage {
    format: TextureFormat,
    width: u32,
    height: u32,
    depth: u32,
    data: Vec<u8>,
}

impl BufferedImage {
    pub fn new_1d(format: TextureFormat, width: u32, data: Vec<u8>) -> GpuResult<Self> {
        Self::new(format, width, 1, 1, data)
    }

    pub fn new_2d(format: TextureFormat, width: u32, height: u32, data: Vec<u8>) -> GpuResult<Self> {
        Self::new(format, width, height, 1, data)
    }

    pub fn new_3d(
        format: TextureFormat,
        width: u32,
        height: u32,
        depth: u32,
        data: Vec<u8>,
    ) -> GpuResult<Self> {
        Self::new(format, width, height, depth, data)
    }

    fn new(format: TextureFormat, width: u32, height: u32, depth: u32, data: Vec<u8>) -> GpuResult<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(GpuError::InvalidPayload(format!(
                "empty image {}x{}x{}",
                width, height, depth
            )));
        }
        let required = format.pixel_size() as u64 * width as u64 * height as u64 * depth as u64;
        if (data.len() as u64) < required {
            return Err(GpuError::InvalidPayload(format!(
                "{}x{}x{} {} image needs {} bytes, got {}",
                width,
                height,
                depth,
                format,
                required,
                data.len()
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            depth,
            data,
        })
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn extent(&self) -> Extent3d {
        Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.depth,
        }
    }

    /// Tightly packed rows; `rows_per_image` equals the height (1 for 1D)
    pub fn layout(&self) -> ImageDataLayout {
        ImageDataLayout {
            offset: 0,
            bytes_per_row: self.format.pixel_size() * self.width,
            rows_per_image: self.height,
        }
    }

    fn same_shape(&self, other: &BufferedImage) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }
}

impl fmt::Debug for BufferedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedImage")
            .field("format", &self.format)
            .field("size", &(self.width, self.height, self.depth))
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Cube map face in upload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Array layer of this face within one cube
    pub const fn layer(self) -> u32 {
        self as u32
    }
}

/// Six square 2D images with equal size and format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeImage {
    faces: [BufferedImage; 6],
}

impl CubeImage {
    pub fn new(
        pos_x: BufferedImage,
        neg_x: BufferedImage,
        pos_y: BufferedImage,
        neg_y: BufferedImage,
        pos_z: BufferedImage,
        neg_z: BufferedImage,
    ) -> GpuResult<Self> {
        let faces = [pos_x, neg_x, pos_y, neg_y, pos_z, neg_z];
        let first = &faces[0];
        if first.depth != 1 || first.width != first.height {
            return Err(GpuError::InvalidPayload(format!(
                "cube faces must be square 2D images, got {}x{}x{}",
                first.width, first.height, first.depth
            )));
        }
        if let Some(face) = faces.iter().position(|f| !f.same_shape(first) || f.depth != 1) {
            return Err(GpuError::InvalidPayload(format!(
                "cube face {:?} differs in size or format",
                CubeFace::ALL[face]
            )));
        }
        Ok(Self { faces })
    }

    pub fn face(&self, face: CubeFace) -> &BufferedImage {
        &self.faces[face.layer() as usize]
    }

    /// Faces in upload order
    pub fn faces(&self) -> impl Iterator<Item = (CubeFace, &BufferedImage)> {
        CubeFace::ALL.into_iter().zip(self.faces.iter())
    }

    pub fn format(&self) -> TextureFormat {
        self.faces[0].format
    }

    pub fn size(&self) -> u32 {
        self.faces[0].width
    }
}

/// Ordered cubes sharing size and format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeArrayImage {
    cubes: Vec<CubeImage>,
}

impl CubeArrayImage {
    pub fn new(cubes: Vec<CubeImage>) -> GpuResult<Self> {
        let first = cubes
            .first()
            .ok_or_else(|| GpuError::InvalidPayload("cube array without cubes".to_string()))?;
        if let Some(i) = cubes
            .iter()
            .position(|c| !c.faces[0].same_shape(&first.faces[0]))
        {
            return Err(GpuError::InvalidPayload(format!(
                "cube {} differs in size or format",
                i
            )));
        }
        Ok(Self { cubes })
    }

    pub fn cubes(&self) -> &[CubeImage] {
        &self.cubes
    }

    pub fn format(&self) -> TextureFormat {
        self.cubes[0].format()
    }
}

/// Ordered 2D images sharing size and format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArray2d {
    images: Vec<BufferedImage>,
}

impl ImageArray2d {
    pub fn new(images: Vec<BufferedImage>) -> GpuResult<Self> {
        let first = images
            .first()
            .ok_or_else(|| GpuError::InvalidPayload("2D array without images".to_string()))?;
        if let Some(i) = images
            .iter()
            .position(|img| !img.same_shape(first) || img.depth != 1)
        {
            return Err(GpuError::InvalidPayload(format!(
                "array layer {} differs in size or format",
                i
            )));
        }
        Ok(Self { images })
    }

    pub fn images(&self) -> &[BufferedImage] {
        &self.images
    }

    pub fn format(&self) -> TextureFormat {
        self.images[0].format
    }
}

/// Image owned by the platform (decoded bitmap, canvas, video frame)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeImage {
    pub label: String,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Pending upload payload of a texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    Buffered1d(BufferedImage),
    Buffered2d(BufferedImage),
    Buffered3d(BufferedImage),
    Cube(CubeImage),
    CubeArray(CubeArrayImage),
    Array2d(ImageArray2d),
    Native(NativeImage),
}

impl ImageData {
    /// Name of the payload kind, used in error messages
    pub const fn kind(&self) -> &'static str {
        match self {
            ImageData::Buffered1d(_) => "buffered-1d",
            ImageData::Buffered2d(_) => "buffered-2d",
            ImageData::Buffered3d(_) => "buffered-3d",
            ImageData::Cube(_) => "cube",
            ImageData::CubeArray(_) => "cube-array",
            ImageData::Array2d(_) => "2d-array",
            ImageData::Native(_) => "native",
        }
    }

    pub fn format(&self) -> TextureFormat {
        match self {
            ImageData::Buffered1d(img) | ImageData::Buffered2d(img) | ImageData::Buffered3d(img) => {
                img.format
            }
            ImageData::Cube(cube) => cube.format(),
            ImageData::CubeArray(cubes) => cubes.format(),
            ImageData::Array2d(images) => images.format(),
            ImageData::Native(native) => native.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(value: u8) -> BufferedImage {
        BufferedImage::new_2d(TextureFormat::Rgba8Unorm, 2, 2, vec![value; 16]).unwrap()
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = BufferedImage::new_2d(TextureFormat::Rgba8Unorm, 4, 4, vec![0; 63]);
        assert!(matches!(err, Err(GpuError::InvalidPayload(_))));
        assert!(BufferedImage::new_1d(TextureFormat::R8Unorm, 0, vec![]).is_err());
    }

    #[test]
    fn test_layout() {
        let img = BufferedImage::new_3d(TextureFormat::Rg16Float, 8, 4, 2, vec![0; 256]).unwrap();
        assert_eq!(
            img.layout(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: 32,
                rows_per_image: 4
            }
        );

        let line = BufferedImage::new_1d(TextureFormat::R32Float, 16, vec![0; 64]).unwrap();
        assert_eq!(line.layout().rows_per_image, 1);
    }

    #[test]
    fn test_cube_face_order() {
        let cube = CubeImage::new(face(0), face(1), face(2), face(3), face(4), face(5)).unwrap();
        let order: Vec<(u32, u8)> = cube
            .faces()
            .map(|(f, img)| (f.layer(), img.data()[0]))
            .collect();
        assert_eq!(order, vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        assert_eq!(cube.face(CubeFace::NegY).data()[0], 3);
    }

    #[test]
    fn test_cube_faces_must_match() {
        let odd = BufferedImage::new_2d(TextureFormat::Rgba8Unorm, 4, 4, vec![0; 64]).unwrap();
        assert!(CubeImage::new(face(0), face(1), odd, face(3), face(4), face(5)).is_err());
        assert!(CubeArrayImage::new(vec![]).is_err());
    }

    #[test]
    fn test_kind_names() {
        let data = ImageData::Array2d(ImageArray2d::new(vec![face(1), face(2)]).unwrap());
        assert_eq!(data.kind(), "2d-array");
        assert_eq!(data.format(), TextureFormat::Rgba8Unorm);
    }
}
