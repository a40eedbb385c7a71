//! Deserializable shape of the TOML configuration tree (spec §6): `assets`,
//! `scene`, `renderer`. Named assets and scene-node roles carry a `type`
//! string plus free-form parameters, a dynamic component system (spec §4.9)
//! — [`crate::registry`] is what turns the `type` string into a constructor
//! call during [`crate::build::build`].

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ConfigTree {
    #[serde(default)]
    pub assets: AssetsConfig,
    pub scene: SceneNodeConfig,
    pub renderer: RendererConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct AssetsConfig {
    #[serde(default)]
    pub meshes: HashMap<String, MeshConfig>,
    #[serde(default)]
    pub bsdfs: HashMap<String, NamedConfig>,
    #[serde(default)]
    pub films: HashMap<String, FilmConfig>,
    #[serde(default)]
    pub cameras: HashMap<String, NamedConfig>,
    #[serde(default)]
    pub lights: HashMap<String, NamedConfig>,
    #[serde(default)]
    pub textures: HashMap<String, TextureConfig>,
}

/// A named texture (spec §6: "named textures (bitmap HDR)") — a uniform
/// color, or an HDR bitmap loaded from disk and tiled by `scale`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum TextureConfig {
    Constant { color: [f32; 3] },
    Bitmap {
        path: String,
        #[serde(default = "default_texture_scale")]
        scale: [f32; 2],
    },
}

fn default_texture_scale() -> [f32; 2] {
    [1.0, 1.0]
}

/// A `type` tag plus whatever other keys that type needs, resolved later by
/// a [`crate::registry::Registry`] rather than by a fixed enum of variants.
#[derive(Deserialize, Debug, Clone)]
pub struct NamedConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: toml::Table,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MeshConfig {
    File {
        path: String,
    },
    Inline {
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        #[serde(default)]
        uvs: Option<Vec<[f32; 2]>>,
        indices: Vec<[u32; 3]>,
    },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    RadianceHdr,
    OpenExr,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FilmConfig {
    pub width: u32,
    pub height: u32,
    pub output: String,
    pub image_type: ImageType,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SceneNodeConfig {
    #[serde(default)]
    pub transform: Option<TransformConfig>,
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default)]
    pub bsdf: Option<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub light: Option<String>,
    #[serde(default)]
    pub children: Vec<SceneNodeConfig>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum TransformConfig {
    Matrix([[f32; 4]; 4]),
    Compose(Vec<TransformOp>),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum TransformOp {
    Translate { v: [f32; 3] },
    Rotate { angle: f32, axis: [f32; 3] },
    Scale { v: [f32; 3] },
}

#[derive(Deserialize, Debug, Clone)]
pub struct SamplerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub seed: u32,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MisWeightKind {
    Balance,
    #[default]
    Power,
}

fn default_rr_depth() -> u32 {
    5
}

fn default_samples_per_block() -> u64 {
    16384
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RendererConfig {
    Bpt {
        num_samples: u64,
        #[serde(default = "default_rr_depth")]
        rr_depth: u32,
        #[serde(default)]
        num_threads: u32,
        #[serde(default = "default_samples_per_block")]
        samples_per_block: u64,
        sampler: SamplerConfig,
        #[serde(default)]
        mis_weight: MisWeightKind,
    },
    Raycast {
        #[serde(default)]
        num_threads: u32,
    },
}

pub fn parse(source: &str) -> Result<ConfigTree, toml::de::Error> {
    toml::from_str(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_empty_scene_config() {
        let src = r#"
            [scene]
            [scene.transform]
            [[scene.children]]
            camera = "main"

            [assets.cameras.main]
            type = "perspective"
            fovy = 60.0

            [assets.films.out]
            width = 4
            height = 4
            output = "out.hdr"
            image_type = "radiancehdr"

            [renderer]
            type = "raycast"
        "#;
        let tree = parse(src).expect("should parse");
        assert_eq!(tree.scene.children.len(), 1);
        assert!(matches!(tree.renderer, RendererConfig::Raycast { .. }));
    }

    #[test]
    fn parses_bpt_renderer_with_defaults() {
        let src = r#"
            [scene]

            [renderer]
            type = "bpt"
            num_samples = 64
            [renderer.sampler]
            type = "independent"
            seed = 42
        "#;
        let tree = parse(src).expect("should parse");
        match tree.renderer {
            RendererConfig::Bpt { rr_depth, samples_per_block, sampler, .. } => {
                assert_eq!(rr_depth, 5);
                assert_eq!(samples_per_block, 16384);
                assert_eq!(sampler.seed, 42);
            }
            _ => panic!("expected a bpt renderer"),
        }
    }

    #[test]
    fn transform_compose_list_parses_each_op() {
        let src = r#"
            transform = [
                { op = "translate", v = [1.0, 0.0, 0.0] },
                { op = "rotate", angle = 45.0, axis = [0.0, 1.0, 0.0] },
                { op = "scale", v = [2.0, 2.0, 2.0] },
            ]
            [[children]]
        "#;
        let node: SceneNodeConfig = toml::from_str(src).expect("should parse");
        match node.transform.unwrap() {
            TransformConfig::Compose(ops) => assert_eq!(ops.len(), 3),
            _ => panic!("expected a compose list"),
        }
    }
}
