//! Compute shader management.

use std::num::NonZeroU64;

use pollster::FutureExt;

use crate::error::{RenderError, RenderResult};

/// A compiled compute program with its single bind group layout.
pub struct ComputeProgram {
    /// The compute pipeline.
    pub pipeline: wgpu::ComputePipeline,
    /// Layout of bind group 0.
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// Builder for creating compute programs.
///
/// Bindings are declared in the order they appear in the shader's group 0.
pub struct ComputeProgramBuilder {
    source: Option<String>,
    entry: String,
    label: Option<String>,
    entries: Vec<wgpu::BindGroupLayoutEntry>,
}

impl ComputeProgramBuilder {
    /// Creates a new compute program builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            entry: "main".to_string(),
            label: None,
            entries: Vec::new(),
        }
    }

    /// Sets the shader source (WGSL).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the entry point. Defaults to `main`.
    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Sets the label for debugging.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn with_binding(mut self, ty: wgpu::BindingType) -> Self {
        let binding = self.entries.len() as u32;
        self.entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty,
            count: None,
        });
        self
    }

    /// Adds a uniform buffer binding of at least `size` bytes.
    #[must_use]
    pub fn with_uniform(self, size: u64) -> Self {
        self.with_binding(wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size),
        })
    }

    /// Adds a read-only storage buffer binding.
    #[must_use]
    pub fn with_storage_buffer(self) -> Self {
        self.with_binding(wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        })
    }

    /// Adds a 3D float texture read with `textureLoad`.
    #[must_use]
    pub fn with_texture_3d(self) -> Self {
        self.with_binding(wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D3,
            multisampled: false,
        })
    }

    /// Adds a write-only 3D storage texture.
    #[must_use]
    pub fn with_storage_texture_3d(self, format: wgpu::TextureFormat) -> Self {
        self.with_binding(wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D3,
        })
    }

    /// Compiles the module and creates the pipeline.
    ///
    /// Validation errors are captured and returned instead of reaching the
    /// device's uncaptured error handler.
    pub fn build(self, device: &wgpu::Device) -> RenderResult<ComputeProgram> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| RenderError::ShaderCompilationFailed("missing compute shader".into()))?;
        let label = self.label.as_deref();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });
        if let Some(err) = device.pop_error_scope().block_on() {
            return Err(RenderError::ShaderCompilationFailed(format!(
                "{}: {err}",
                label.unwrap_or("compute shader")
            )));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label,
            entries: &self.entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label,
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(&self.entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
        if let Some(err) = device.pop_error_scope().block_on() {
            return Err(RenderError::PipelineCreationFailed(format!(
                "{}: {err}",
                label.unwrap_or("compute pipeline")
            )));
        }

        log::info!("Created compute pipeline {}", label.unwrap_or("<unnamed>"));
        Ok(ComputeProgram {
            pipeline,
            bind_group_layout,
        })
    }
}

impl Default for ComputeProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_are_numbered_in_order() {
        let builder = ComputeProgramBuilder::new()
            .with_uniform(48)
            .with_storage_buffer()
            .with_texture_3d()
            .with_storage_texture_3d(wgpu::TextureFormat::Rgba32Float);
        let bindings: Vec<u32> = builder.entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3]);
        assert!(matches!(
            builder.entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
    }

    #[test]
    fn test_default_entry_is_main() {
        assert_eq!(ComputeProgramBuilder::default().entry, "main");
        assert_eq!(ComputeProgramBuilder::new().with_entry("cs_main").entry, "cs_main");
    }
}
