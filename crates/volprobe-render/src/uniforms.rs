//! Named uniform tables laid out for WGSL.
//!
//! A [`UniformBlock`] mirrors one WGSL `struct` in the uniform address
//! space. Fields are declared in the same order as the shader struct and
//! packed with the WGSL alignment rules, so `bytes()` can be copied straight
//! into a uniform buffer.
//!
//! Setting a field that does not exist, or with a value of the wrong type,
//! leaves the block unchanged.

use glam::{IVec2, IVec3, IVec4, Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

/// WGSL type of a uniform field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    F32,
    I32,
    U32,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat4,
    /// `array<f32, N>`; elements use a 16-byte stride in uniform memory.
    FloatArray(usize),
    /// `array<vec3<f32>, N>`.
    Vec3Array(usize),
    /// `array<vec4<f32>, N>`.
    Vec4Array(usize),
}

impl UniformType {
    /// `AlignOf` in the uniform address space.
    #[must_use]
    pub fn align(self) -> usize {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::Vec2 | Self::IVec2 => 8,
            _ => 16,
        }
    }

    /// `SizeOf` in the uniform address space.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::Vec2 | Self::IVec2 => 8,
            Self::Vec3 | Self::IVec3 => 12,
            Self::Vec4 | Self::IVec4 => 16,
            Self::Mat4 => 64,
            Self::FloatArray(n) | Self::Vec3Array(n) | Self::Vec4Array(n) => 16 * n,
        }
    }

    fn same_kind(self, other: Self) -> bool {
        match (self, other) {
            (Self::FloatArray(cap), Self::FloatArray(n))
            | (Self::Vec3Array(cap), Self::Vec3Array(n))
            | (Self::Vec4Array(cap), Self::Vec4Array(n)) => n <= cap,
            _ => self == other,
        }
    }
}

/// A value assignable to a uniform field.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Vec3Array(Vec<Vec3>),
    Vec4Array(Vec<Vec4>),
}

impl UniformValue {
    #[must_use]
    pub fn ty(&self) -> UniformType {
        match self {
            Self::F32(_) => UniformType::F32,
            Self::I32(_) => UniformType::I32,
            Self::U32(_) => UniformType::U32,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::IVec2(_) => UniformType::IVec2,
            Self::IVec3(_) => UniformType::IVec3,
            Self::IVec4(_) => UniformType::IVec4,
            Self::Mat4(_) => UniformType::Mat4,
            Self::FloatArray(v) => UniformType::FloatArray(v.len()),
            Self::Vec3Array(v) => UniformType::Vec3Array(v.len()),
            Self::Vec4Array(v) => UniformType::Vec4Array(v.len()),
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            Self::F32(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::I32(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::U32(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out[..8].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec3(v) => out[..12].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec4(v) => out[..16].copy_from_slice(bytemuck::bytes_of(v)),
            Self::IVec2(v) => out[..8].copy_from_slice(bytemuck::bytes_of(v)),
            Self::IVec3(v) => out[..12].copy_from_slice(bytemuck::bytes_of(v)),
            Self::IVec4(v) => out[..16].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Mat4(m) => out[..64].copy_from_slice(bytemuck::bytes_of(m)),
            Self::FloatArray(values) => {
                for (chunk, v) in out.chunks_exact_mut(16).zip(values) {
                    chunk[..4].copy_from_slice(bytemuck::bytes_of(v));
                }
            }
            Self::Vec3Array(values) => {
                for (chunk, v) in out.chunks_exact_mut(16).zip(values) {
                    chunk[..12].copy_from_slice(bytemuck::bytes_of(v));
                }
            }
            Self::Vec4Array(values) => {
                for (chunk, v) in out.chunks_exact_mut(16).zip(values) {
                    chunk.copy_from_slice(bytemuck::bytes_of(v));
                }
            }
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

impl_from_value!(
    f32 => F32,
    i32 => I32,
    u32 => U32,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    Mat4 => Mat4,
    Vec<f32> => FloatArray,
    Vec<Vec3> => Vec3Array,
    Vec<Vec4> => Vec4Array,
);

#[derive(Debug, Clone)]
struct UniformField {
    name: String,
    ty: UniformType,
    offset: usize,
}

/// CPU copy of one uniform struct, addressed by field name.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    label: String,
    fields: Vec<UniformField>,
    data: Vec<u8>,
}

impl UniformBlock {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Appends a field after the previous one, honoring its alignment.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, ty: UniformType) -> Self {
        let end = self
            .fields
            .last()
            .map_or(0, |f| f.offset + f.ty.size());
        let offset = end.next_multiple_of(ty.align());
        self.fields.push(UniformField {
            name: name.into(),
            ty,
            offset,
        });
        self.data.resize((offset + ty.size()).next_multiple_of(16), 0);
        self
    }

    /// Writes `value` into field `name`.
    ///
    /// Returns whether the field was written. Unknown names and mismatched
    /// types are skipped.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        let value = value.into();
        let Some(field) = self.fields.iter().find(|f| f.name == name) else {
            log::trace!("{}: no uniform named {name}", self.label);
            return false;
        };
        if !field.ty.same_kind(value.ty()) {
            log::warn!(
                "{}: uniform {name} is {:?}, got {:?}",
                self.label,
                field.ty,
                value.ty()
            );
            return false;
        }
        let start = field.offset;
        let end = start + field.ty.size();
        value.write(&mut self.data[start..end]);
        true
    }

    /// Byte offset of `name`, if declared.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.offset)
    }

    /// Struct size, rounded up to 16 bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Creates a uniform buffer initialized with the current contents.
    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&self.label),
            contents: &self.data,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Copies the current contents into `buffer`.
    pub fn upload(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, &self.data);
    }
}
