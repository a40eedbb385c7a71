//! Lowers a parsed [`crate::config::ConfigTree`] into runtime `core` types:
//! resolves every named asset through the component registries, walks the
//! scene-node tree composing transforms and flattening primitives, and
//! builds the accelerator. A two-phase "parse, then build" component model
//! (spec §4.9) without a process-wide singleton registry —
//! [`crate::registry::Registry`] values here are owned locally by this one
//! call.

use std::collections::HashMap;
use std::sync::Arc;

use accelerators::{LeafMode, Qbvh};
use core::error::ReferenceError;
use core::film::Film;
use core::gbsdf::arealight::AreaLightDir;
use core::gbsdf::Gbsdf;
use core::mat::{Mat4, Transform};
use core::mesh::TriangleMesh;
use core::pbrt::Float;
use core::primitive::Primitive;
use core::scene::Scene;
use core::vec::{Point2f, Vec3f, Vec4f};

use crate::config::{ConfigTree, FilmConfig, ImageType, MeshConfig, MisWeightKind, RendererConfig, SceneNodeConfig, TextureConfig, TransformConfig, TransformOp};
use crate::error::LoadError;
use crate::obj;
use crate::registry::{bsdf_registry, camera_registry, light_registry, CameraParams};

pub struct BuiltScene {
    pub scene: Scene,
    pub film: Film,
    pub output_path: String,
    pub image_type: ImageType,
    pub renderer: RenderSettings,
}

#[derive(Clone, Debug)]
pub enum RenderSettings {
    Bpt {
        config: core::bpt::driver::BptConfig,
        num_samples: u64,
        num_threads: u32,
        samples_per_block: u64,
        seed: u32,
    },
    Raycast {
        num_threads: u32,
    },
}

struct ResolvedAssets {
    meshes: HashMap<String, Arc<TriangleMesh>>,
    bsdfs: HashMap<String, Gbsdf>,
    lights: HashMap<String, (Vec3f, bool)>,
    cameras: HashMap<String, (CameraParams, String)>,
    films: HashMap<String, FilmConfig>,
}

/// Loads a named texture asset (spec §6) into its runtime [`core::texture::Texture`]
/// representation: a bitmap is read from disk once here and shared via `Arc`
/// by every BSDF parameter that references it.
fn load_texture(name: &str, cfg: &TextureConfig) -> Result<core::texture::Texture, LoadError> {
    match cfg {
        TextureConfig::Constant { color } => Ok(core::texture::Texture::Constant(Vec3f::new(color[0], color[1], color[2]))),
        TextureConfig::Bitmap { path, scale } => {
            let decoded = image::open(path).map_err(|e| core::error::AssetError::MeshParse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            let rgb = decoded.into_rgb32f();
            let (width, height) = rgb.dimensions();
            let pixels = rgb.pixels().map(|p| Vec3f::new(p[0], p[1], p[2])).collect();
            let bitmap = core::texture::Bitmap::new(width, height, pixels);
            Ok(core::texture::Texture::Bitmap(Arc::new(bitmap), Point2f::new(scale[0], scale[1])))
        }
    }
}

/// A constant-albedo BSDF (`diffuse`/`all`) may reference a named texture
/// instead of an inline `albedo` array; since those BSDFs only ever carry a
/// uniform color (spec §6 lists no per-texel-varying BSDF parameter), a
/// bitmap texture is reduced to its mean color here before the parameters
/// reach [`crate::registry::bsdf_registry`].
fn splice_texture_albedo(params: &toml::Table, textures: &HashMap<String, core::texture::Texture>) -> Result<toml::Table, LoadError> {
    let mut params = params.clone();
    if params.contains_key("albedo") {
        return Ok(params);
    }
    let Some(name) = params.get("texture").and_then(|v| v.as_str()) else {
        return Ok(params);
    };
    let texture = textures.get(name).ok_or_else(|| ReferenceError::Undeclared { category: "texture", name: name.to_string() })?;
    let mean = match texture {
        core::texture::Texture::Constant(c) => *c,
        core::texture::Texture::Bitmap(bitmap, _) => {
            let sum: Vec3f = bitmap.pixels.iter().fold(Vec3f::splat(0.0), |a, p| a + *p);
            sum / (bitmap.pixels.len().max(1) as Float)
        }
    };
    params.insert("albedo".to_string(), toml::Value::Array(vec![toml::Value::Float(mean.x as f64), toml::Value::Float(mean.y as f64), toml::Value::Float(mean.z as f64)]));
    Ok(params)
}

fn resolve_assets(tree: &ConfigTree) -> Result<ResolvedAssets, LoadError> {
    let mut meshes = HashMap::new();
    for (name, cfg) in &tree.assets.meshes {
        let mesh = match cfg {
            MeshConfig::File { path } => {
                let source = std::fs::read_to_string(path).map_err(|e| core::error::AssetError::Io(e))?;
                obj::parse(name, &source)?
            }
            MeshConfig::Inline { positions, normals, uvs, indices } => {
                if normals.len() != positions.len() {
                    return Err(core::error::AssetError::MeshParse {
                        name: name.clone(),
                        reason: "normals length must match positions length".to_string(),
                    }
                    .into());
                }
                let uvs = match uvs {
                    Some(uvs) => uvs.iter().map(|u| Point2f::new(u[0], u[1])).collect(),
                    None => vec![Point2f::new(0.0, 0.0); positions.len()],
                };
                Arc::new(TriangleMesh::new(
                    positions.iter().map(|p| Vec3f::new(p[0], p[1], p[2])).collect(),
                    normals.iter().map(|n| Vec3f::new(n[0], n[1], n[2])).collect(),
                    uvs,
                    indices.clone(),
                ))
            }
        };
        meshes.insert(name.clone(), mesh);
    }

    let mut textures = HashMap::new();
    for (name, cfg) in &tree.assets.textures {
        textures.insert(name.clone(), load_texture(name, cfg)?);
    }

    let bsdf_reg = bsdf_registry();
    let mut bsdfs = HashMap::new();
    for (name, cfg) in &tree.assets.bsdfs {
        let params = splice_texture_albedo(&cfg.params, &textures)?;
        bsdfs.insert(name.clone(), bsdf_reg.build(&cfg.kind, &params, "bsdf")?);
    }

    let light_reg = light_registry();
    let mut lights = HashMap::new();
    for (name, cfg) in &tree.assets.lights {
        lights.insert(name.clone(), light_reg.build(&cfg.kind, &cfg.params, "light")?);
    }

    let camera_reg = camera_registry();
    let mut cameras = HashMap::new();
    for (name, cfg) in &tree.assets.cameras {
        let params = camera_reg.build(&cfg.kind, &cfg.params, "camera")?;
        let film_ref = cfg
            .params
            .get("film")
            .and_then(|v| v.as_str())
            .ok_or_else(|| core::error::ConfigError::MissingField("film".to_string()))?
            .to_string();
        cameras.insert(name.clone(), (params, film_ref));
    }

    Ok(ResolvedAssets {
        meshes,
        bsdfs,
        lights,
        cameras,
        films: tree.assets.films.clone(),
    })
}

/// Composes one node's own `transform` field into a single local `Transform`
/// (identity if absent). A `Compose` list is applied in listed order — the
/// first op acts on the object first, the last op last, i.e. `transform =
/// [translate, rotate, scale]` yields `scale(rotate(translate(p)))`.
fn local_transform(cfg: &Option<TransformConfig>) -> Transform {
    match cfg {
        None => Transform::identity(),
        Some(TransformConfig::Matrix(m)) => Transform::new(Mat4::from_rows([
            Vec4f::new(m[0][0], m[0][1], m[0][2], m[0][3]),
            Vec4f::new(m[1][0], m[1][1], m[1][2], m[1][3]),
            Vec4f::new(m[2][0], m[2][1], m[2][2], m[2][3]),
            Vec4f::new(m[3][0], m[3][1], m[3][2], m[3][3]),
        ])),
        Some(TransformConfig::Compose(ops)) => ops.iter().fold(Transform::identity(), |acc, op| {
            let op_t = match op {
                TransformOp::Translate { v } => Transform::new(Mat4::translate(Vec3f::new(v[0], v[1], v[2]))),
                TransformOp::Rotate { angle, axis } => Transform::new(Mat4::rotate(*angle, Vec3f::new(axis[0], axis[1], axis[2]))),
                TransformOp::Scale { v } => Transform::new(Mat4::scale(Vec3f::new(v[0], v[1], v[2]))),
            };
            acc.then(&op_t)
        }),
    }
}

struct CameraOutput {
    film: Film,
    output_path: String,
    image_type: ImageType,
}

fn collect_primitives(
    node: &SceneNodeConfig,
    parent_world: &Transform,
    assets: &ResolvedAssets,
    primitives: &mut Vec<Primitive>,
    camera_output: &mut Option<CameraOutput>,
) -> Result<(), LoadError> {
    let world = local_transform(&node.transform).then(parent_world);

    let mesh = node
        .mesh
        .as_ref()
        .map(|name| {
            assets
                .meshes
                .get(name)
                .cloned()
                .ok_or_else(|| ReferenceError::Undeclared { category: "mesh", name: name.clone() })
        })
        .transpose()?;

    // When a node pairs a mesh with a light, build the emitting primitive
    // through `lights::build_area_light` (the dedicated constructor for
    // that combination); fall back to a plain primitive otherwise so a
    // mesh can still carry a surface BSDF with no light at all.
    let mut prim = match (&mesh, &node.light) {
        (Some(mesh), Some(name)) => {
            let (radiance, two_sided) = *assets.lights.get(name).ok_or_else(|| ReferenceError::Undeclared { category: "light", name: name.clone() })?;
            lights::build_area_light(world, mesh.clone(), radiance, two_sided)
        }
        _ => {
            let mut prim = Primitive::new(world);
            prim.mesh = mesh.clone();
            if let Some(name) = &node.light {
                let (radiance, two_sided) = *assets.lights.get(name).ok_or_else(|| ReferenceError::Undeclared { category: "light", name: name.clone() })?;
                prim.light = Some(Gbsdf::AreaLightDir(AreaLightDir { radiance, two_sided }));
            }
            prim
        }
    };

    if let Some(name) = &node.bsdf {
        let g = *assets.bsdfs.get(name).ok_or_else(|| ReferenceError::Undeclared { category: "bsdf", name: name.clone() })?;
        prim.bsdf = Some(g);
    }

    if let Some(name) = &node.camera {
        let (params, film_ref) = assets.cameras.get(name).cloned().ok_or_else(|| ReferenceError::Undeclared { category: "camera", name: name.clone() })?;
        let film_cfg = assets.films.get(&film_ref).ok_or_else(|| ReferenceError::Undeclared { category: "film", name: film_ref.clone() })?;

        let dir = match params {
            CameraParams::Perspective { fov_y_degrees } => {
                cameras::from_camera_to_world(world, fov_y_degrees, film_cfg.width, film_cfg.height).dir
            }
            CameraParams::ThinLens { fov_y_degrees, lens_radius, focal_distance } => {
                cameras::thin_lens_from_camera_to_world(world, fov_y_degrees, lens_radius, focal_distance, film_cfg.width, film_cfg.height).dir
            }
        };
        prim.camera = Some(dir);

        // A second camera node makes `scene.build()` fail with
        // `BuildError::MultipleCameras`; no need to duplicate that check here.
        *camera_output = Some(CameraOutput {
            film: Film::new(film_cfg.width, film_cfg.height),
            output_path: film_cfg.output.clone(),
            image_type: film_cfg.image_type,
        });
    }

    primitives.push(prim);

    for child in &node.children {
        collect_primitives(child, &world, assets, primitives, camera_output)?;
    }
    Ok(())
}

fn mis_beta(kind: MisWeightKind) -> Float {
    match kind {
        MisWeightKind::Balance => 1.0,
        MisWeightKind::Power => 2.0,
    }
}

pub fn build(tree: &ConfigTree) -> Result<BuiltScene, LoadError> {
    let assets = resolve_assets(tree)?;

    let mut primitives = Vec::new();
    let mut camera_output = None;
    collect_primitives(&tree.scene, &Transform::identity(), &assets, &mut primitives, &mut camera_output)?;

    let mut scene = Scene::new(primitives, Box::new(Qbvh::new(LeafMode::Scalar)));
    scene.build()?;

    // `scene.build()` above already rejected zero or multiple camera
    // primitives, so exactly one camera node was visited.
    let camera_output = camera_output.expect("scene.build() succeeded, so exactly one camera node was visited");

    let renderer = match &tree.renderer {
        RendererConfig::Bpt { num_samples, rr_depth, num_threads, samples_per_block, sampler, mis_weight } => RenderSettings::Bpt {
            config: core::bpt::driver::BptConfig {
                rr_depth: *rr_depth,
                max_vertices: core::bpt::driver::BptConfig::default().max_vertices,
                mis_beta: mis_beta(*mis_weight),
                light_tracing_enabled: false,
            },
            num_samples: *num_samples,
            num_threads: *num_threads,
            samples_per_block: *samples_per_block,
            seed: sampler.seed,
        },
        RendererConfig::Raycast { num_threads } => RenderSettings::Raycast { num_threads: *num_threads },
    };

    Ok(BuiltScene {
        scene,
        film: camera_output.film,
        output_path: camera_output.output_path,
        image_type: camera_output.image_type,
        renderer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse;

    #[test]
    fn a_bsdf_referencing_a_constant_texture_resolves_its_albedo() {
        let src = r#"
            [assets.textures.wall_color]
            color = [0.2, 0.4, 0.6]

            [assets.bsdfs.wall]
            type = "diffuse"
            texture = "wall_color"

            [assets.films.out]
            width = 1
            height = 1
            output = "out.hdr"
            image_type = "radiancehdr"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0
            film = "out"

            [scene]
            camera = "main"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).unwrap();
        let assets = resolve_assets(&tree).expect("should resolve");
        match assets.bsdfs.get("wall") {
            Some(Gbsdf::Diffuse(d)) => assert!((d.albedo - Vec3f::new(0.2, 0.4, 0.6)).length() < 1e-4),
            other => panic!("expected a diffuse bsdf, got {other:?}"),
        }
    }

    #[test]
    fn a_bsdf_referencing_an_undeclared_texture_is_a_reference_error() {
        let src = r#"
            [assets.bsdfs.wall]
            type = "diffuse"
            texture = "does_not_exist"
        "#;
        let tree: ConfigTree = toml::from_str(&format!(
            "{src}\n[assets.films.out]\nwidth=1\nheight=1\noutput=\"out.hdr\"\nimage_type=\"radiancehdr\"\n[assets.cameras.main]\ntype=\"perspective\"\nfovy=60.0\nfilm=\"out\"\n[scene]\ncamera=\"main\"\n[renderer]\ntype=\"raycast\"\n"
        ))
        .unwrap();
        assert!(matches!(resolve_assets(&tree), Err(LoadError::Reference(ReferenceError::Undeclared { .. }))));
    }

    #[test]
    fn empty_scene_builds_with_no_lights_or_meshes() {
        let src = r#"
            [assets.films.out]
            width = 4
            height = 4
            output = "out.hdr"
            image_type = "radiancehdr"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0
            film = "out"

            [scene]
            camera = "main"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).unwrap();
        let built = build(&tree).expect("should build");
        assert_eq!(built.scene.num_lights(), 0);
        assert_eq!(built.film.width, 4);
        assert!(matches!(built.renderer, RenderSettings::Raycast { .. }));

        let mut ray = core::ray::Ray::with_range(Vec3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        assert!(built.scene.intersect(&mut ray).is_none());
    }

    #[test]
    fn a_single_triangle_loaded_end_to_end_is_hit_through_its_centroid() {
        let src = r#"
            [assets.films.out]
            width = 16
            height = 16
            output = "out.hdr"
            image_type = "radiancehdr"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0
            film = "out"

            [assets.meshes.tri]
            positions = [[-1.0,-1.0,0.0],[1.0,-1.0,0.0],[0.0,1.0,0.0]]
            normals = [[0.0,0.0,1.0],[0.0,0.0,1.0],[0.0,0.0,1.0]]
            indices = [[0,1,2]]

            [assets.bsdfs.white]
            type = "diffuse"
            albedo = [1.0, 1.0, 1.0]

            [scene]
            camera = "main"
            [[scene.children]]
            mesh = "tri"
            bsdf = "white"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).unwrap();
        let built = build(&tree).expect("should build");

        let mut hit_ray = core::ray::Ray::with_range(Vec3f::new(0.0, -0.33, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        assert!(built.scene.intersect(&mut hit_ray).is_some());

        let mut miss_ray = core::ray::Ray::with_range(Vec3f::new(10.0, 10.0, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        assert!(built.scene.intersect(&mut miss_ray).is_none());
    }

    #[test]
    fn unresolved_mesh_reference_is_a_reference_error() {
        let src = r#"
            [assets.films.out]
            width = 1
            height = 1
            output = "out.hdr"
            image_type = "radiancehdr"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0
            film = "out"

            [scene]
            camera = "main"
            [[scene.children]]
            mesh = "does_not_exist"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).unwrap();
        assert!(matches!(build(&tree), Err(LoadError::Reference(ReferenceError::Undeclared { .. }))));
    }

    #[test]
    fn a_node_combining_a_light_and_a_mesh_becomes_an_emitting_primitive() {
        let src = r#"
            [assets.films.out]
            width = 1
            height = 1
            output = "out.hdr"
            image_type = "openexr"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0
            film = "out"

            [assets.meshes.quad]
            positions = [[-1.0,-1.0,0.0],[1.0,-1.0,0.0],[1.0,1.0,0.0],[-1.0,1.0,0.0]]
            normals = [[0.0,0.0,1.0],[0.0,0.0,1.0],[0.0,0.0,1.0],[0.0,0.0,1.0]]
            indices = [[0,1,2],[0,2,3]]

            [assets.lights.sun]
            type = "area"
            luminance = [2.0, 2.0, 2.0]

            [scene]
            camera = "main"
            [[scene.children]]
            mesh = "quad"
            light = "sun"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).unwrap();
        let built = build(&tree).expect("should build");
        assert_eq!(built.scene.num_lights(), 1);
    }
}
