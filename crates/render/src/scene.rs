use crate::backend::{BackendError, GpuBackend, ShaderBinding};
use crate::config::RenderConfig;
use crate::lighting::LightingEnvironment;
use crate::target::StereoTargets;
use stereocube_assets::{MeshStore, Texture};
use stereocube_common::DisplayOutput;

/// Texture unit the scene texture is bound to.
pub const SCENE_TEXTURE_UNIT: u32 = 0;

/// Immutable inputs of the scene, uploaded once at init.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub mesh: MeshStore,
    pub texture: Texture,
    pub lighting: LightingEnvironment,
}

impl SceneAssets {
    /// The textured cube under the default light.
    pub fn cube(texture: Texture) -> Self {
        Self {
            mesh: MeshStore::cube(),
            texture,
            lighting: LightingEnvironment::default(),
        }
    }
}

/// Device-side handles produced by [`init_scene`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SceneHandles {
    pub targets: StereoTargets,
    pub uniforms: ShaderBinding,
    pub vertex_count: u32,
}

/// Allocate the eye targets, bind them to the top screen and upload the scene.
/// Any failure here is fatal; nothing is retried.
pub(crate) fn init_scene<B: GpuBackend>(
    backend: &mut B,
    config: &RenderConfig,
    assets: &SceneAssets,
) -> Result<SceneHandles, BackendError> {
    let desc = config.target_descriptor();
    let targets = StereoTargets {
        left: backend.create_target(&desc)?,
        right: backend.create_target(&desc)?,
    };
    tracing::info!(width = desc.width, height = desc.height, "created eye render targets");

    for (_, target) in targets.iter() {
        backend.clear(target, config.clear_color, config.clear_depth);
    }

    for (eye, target) in targets.iter() {
        backend.bind_output(target, DisplayOutput::top(eye))?;
    }
    tracing::info!("bound eye targets to top screen outputs");

    tracing::info!("bound scene shader program");
    let uniforms = ShaderBinding::resolve(&*backend)?;
    tracing::info!(?uniforms, "resolved shader uniforms");

    backend.upload_mesh(&assets.mesh)?;
    tracing::info!(vertices = assets.mesh.vertex_count(), "uploaded mesh");

    backend.bind_texture(SCENE_TEXTURE_UNIT, &assets.texture)?;
    tracing::info!(
        width = assets.texture.width(),
        height = assets.texture.height(),
        unit = SCENE_TEXTURE_UNIT,
        "bound scene texture"
    );

    backend.set_lighting(&assets.lighting)?;
    tracing::info!("lighting environment set");

    Ok(SceneHandles {
        targets,
        uniforms,
        vertex_count: assets.mesh.vertex_count(),
    })
}
