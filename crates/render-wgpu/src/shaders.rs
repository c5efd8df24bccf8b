/// WGSL shader for textured scene meshes.
///
/// Pass-through MVP transform and a single texture sample. Uniform and
/// attribute names match the host-side contract: `model`, `view`,
/// `projection`, `position`, `texture_coord` and `samplerTexture`.
pub const SCENE_SHADER: &str = r#"
struct CameraUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

struct ModelUniforms {
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;

@group(1) @binding(0)
var<uniform> model_uniforms: ModelUniforms;

@group(2) @binding(0)
var samplerTexture: texture_2d<f32>;

@group(2) @binding(1)
var samplerTextureFilter: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texture_coord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) out_texture: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.projection * camera.view * model_uniforms.model
        * vec4<f32>(vertex.position, 1.0);
    out.out_texture = vertex.texture_coord;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(samplerTexture, samplerTextureFilter, in.out_texture);
}
"#;

/// Errors found while checking WGSL before it reaches the device.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("{name}: parse failed: {message}")]
    Parse { name: String, message: String },
    #[error("{name}: validation failed: {message}")]
    Validation { name: String, message: String },
}

/// Parse and validate WGSL with naga.
pub fn validate_wgsl(source: &str, name: &str) -> Result<(), ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        name: name.to_string(),
        message: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| ShaderError::Validation {
            name: name.to_string(),
            message: format!("{e:?}"),
        })?;
    Ok(())
}
