/// Uniform slots exposed by [`SCENE_SHADER`], in slot order.
pub const SCENE_UNIFORMS: [&str; 2] = ["projection", "modelView"];

/// WGSL program for the lit, textured mesh.
///
/// Fragment colour = texture + primary colour, where the primary colour is
/// ambient + emission + diffuse and specular response of the single light.
/// The specular response is read from a 256-entry table packed as 64 vec4s.
pub const SCENE_SHADER: &str = r#"
struct Matrices {
    projection: mat4x4<f32>,
    modelView: mat4x4<f32>,
};

struct Lighting {
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular0: vec4<f32>,
    emission: vec4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    lut: array<vec4<f32>, 64>,
};

@group(0) @binding(0)
var<uniform> matrices: Matrices;

@group(0) @binding(1)
var<uniform> lighting: Lighting;

@group(0) @binding(2)
var scene_texture: texture_2d<f32>;

@group(0) @binding(3)
var scene_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) view_position: vec3<f32>,
    @location(1) view_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let view_pos = matrices.modelView * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = matrices.projection * view_pos;
    out.view_position = view_pos.xyz;
    out.view_normal = (matrices.modelView * vec4<f32>(vertex.normal, 0.0)).xyz;
    // texcoords have a bottom-left origin, texture rows are stored top-down
    out.uv = vec2<f32>(vertex.texcoord.x, 1.0 - vertex.texcoord.y);
    return out;
}

fn specular_lut(x: f32) -> f32 {
    let i = u32(clamp(round(x * 255.0), 0.0, 255.0));
    return lighting.lut[i / 4u][i % 4u];
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.view_normal);
    var l: vec3<f32>;
    if (lighting.light_position.w == 0.0) {
        l = normalize(lighting.light_position.xyz);
    } else {
        l = normalize(lighting.light_position.xyz - in.view_position);
    }
    let n_dot_l = max(dot(n, l), 0.0);

    let light = lighting.light_color.rgb;
    let primary = clamp(
        lighting.emission.rgb
            + lighting.ambient.rgb
            + lighting.diffuse.rgb * light * n_dot_l
            + lighting.specular0.rgb * light * specular_lut(n_dot_l),
        vec3<f32>(0.0),
        vec3<f32>(1.0),
    );

    let texel = textureSample(scene_texture, scene_sampler, in.uv);
    return vec4<f32>(clamp(texel.rgb + primary, vec3<f32>(0.0), vec3<f32>(1.0)), texel.a);
}
"#;

/// WGSL program that copies one eye target onto its half of the window.
pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0)
var eye_texture: texture_2d<f32>;

@group(0) @binding(1)
var eye_sampler: sampler;

struct CompositeOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

// One oversized triangle covering the viewport.
@vertex
fn vs_composite(@builtin(vertex_index) index: u32) -> CompositeOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));

    var out: CompositeOutput;
    out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_composite(in: CompositeOutput) -> @location(0) vec4<f32> {
    return textureSample(eye_texture, eye_sampler, in.uv);
}

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let low = c / 12.92;
    let high = pow((c + 0.055) / 1.055, vec3<f32>(2.4));
    return select(high, low, c <= vec3<f32>(0.04045));
}

// For sRGB surfaces: the hardware encode on write restores the eye bytes.
@fragment
fn fs_composite_srgb(in: CompositeOutput) -> @location(0) vec4<f32> {
    let c = textureSample(eye_texture, eye_sampler, in.uv);
    return vec4<f32>(srgb_to_linear(c.rgb), c.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_shader_declares_its_uniforms() {
        for name in SCENE_UNIFORMS {
            assert!(SCENE_SHADER.contains(&format!("{name}: mat4x4<f32>")));
        }
    }

    #[test]
    fn entry_points_exist() {
        assert!(SCENE_SHADER.contains("fn vs_main"));
        assert!(SCENE_SHADER.contains("fn fs_main"));
        assert!(COMPOSITE_SHADER.contains("fn vs_composite"));
        assert!(COMPOSITE_SHADER.contains("fn fs_composite("));
        assert!(COMPOSITE_SHADER.contains("fn fs_composite_srgb("));
    }
}
