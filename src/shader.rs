// src/shader.rs
//! GPU shader program: one WGSL module per stage, released on drop.

use std::borrow::Cow;
use std::path::Path;

use crate::gpu::capture_validation;
use crate::resource::{ResourceError, ShaderSourceData};

#[derive(Debug)]
pub struct Shader {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

impl Shader {
    /// Compile the vertex and fragment stages of `data`.
    ///
    /// wgpu has no geometry stage, so a program carrying one is rejected with
    /// `GraphicsError`. Sources that fail WGSL validation give `ParseError`.
    pub fn from_sources(
        device: &wgpu::Device,
        label: &str,
        data: &ShaderSourceData,
    ) -> Result<Self, ResourceError> {
        if data.geometry_source.is_some() {
            return Err(ResourceError::graphics_error(
                Path::new(label),
                "geometry shaders are not supported by the wgpu backend",
            ));
        }

        let vertex = compile_stage(device, label, "vertex", &data.vertex_source)?;
        let fragment = compile_stage(device, label, "fragment", &data.fragment_source)?;

        Ok(Self {
            label: label.to_string(),
            vertex,
            fragment,
        })
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn vertex_module(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    #[inline]
    pub fn fragment_module(&self) -> &wgpu::ShaderModule {
        &self.fragment
    }
}

fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    stage: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ResourceError> {
    if source.trim().is_empty() {
        return Err(ResourceError::parse_error(
            Path::new(label),
            format!("{} stage source is empty", stage),
        ));
    }

    let stage_label = format!("{}_{}", label, stage);
    let (module, error) = capture_validation(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&stage_label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        })
    });

    match error {
        None => Ok(module),
        Some(e) => Err(ResourceError::parse_error(
            Path::new(label),
            format!("{} stage failed to compile: {}", stage, e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::WgpuBackend;
    use crate::resource::ResourceErrorKind;
    use crate::testing::{FRAGMENT_WGSL, VERTEX_WGSL};

    fn sources() -> ShaderSourceData {
        ShaderSourceData {
            vertex_source: VERTEX_WGSL.to_string(),
            fragment_source: FRAGMENT_WGSL.to_string(),
            geometry_source: None,
        }
    }

    #[test]
    fn compiles_valid_wgsl() {
        let Some(backend) = WgpuBackend::headless() else {
            eprintln!("no wgpu adapter, skipping");
            return;
        };

        let shader = Shader::from_sources(backend.device(), "basic", &sources()).unwrap();
        assert_eq!(shader.label(), "basic");

        for module in [shader.vertex_module(), shader.fragment_module()] {
            let info = pollster::block_on(module.get_compilation_info());
            assert!(info
                .messages
                .iter()
                .all(|m| !matches!(m.message_type, wgpu::CompilationMessageType::Error)));
        }
    }

    #[test]
    fn invalid_wgsl_is_a_parse_error() {
        let Some(backend) = WgpuBackend::headless() else {
            eprintln!("no wgpu adapter, skipping");
            return;
        };

        let mut data = sources();
        data.fragment_source = "fn broken( {".to_string();

        let err = Shader::from_sources(backend.device(), "broken", &data).unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::ParseError);
        assert!(err.message().contains("fragment"));
    }

    #[test]
    fn geometry_stage_is_rejected() {
        let Some(backend) = WgpuBackend::headless() else {
            eprintln!("no wgpu adapter, skipping");
            return;
        };

        let mut data = sources();
        data.geometry_source = Some("// geometry".to_string());

        let err = Shader::from_sources(backend.device(), "geom", &data).unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::GraphicsError);
    }
}
