//! # Asset Importer Surface
//!
//! The model loader consumes a generic scene/node tree rather than any
//! particular file format: an [`ImportedScene`] with per-mesh triangulated
//! positions/normals/one UV set, per-face index groups, and per-material
//! diffuse/specular texture references. Texture coordinates are expected
//! pre-flipped to the engine's vertical convention by the importer.
//!
//! [`ObjImporter`] is the built-in implementation on top of `tobj`. The
//! parser internals belong to that crate; this module only maps its output
//! into the generic tree (a single root node, since OBJ has no hierarchy).

use cgmath::{InnerSpace, Vector3, Zero};
use log::warn;

use crate::gfx::error::EngineError;

/// One primitive mesh in the imported tree.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// One 2D texture-coordinate set, already V-flipped. `None` when the
    /// source mesh carries no UVs.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Per-face index groups (triangles after import).
    pub faces: Vec<Vec<u32>>,
    /// Index into [`ImportedScene::materials`].
    pub material: Option<usize>,
}

/// One node of the imported hierarchy.
#[derive(Debug, Clone, Default)]
pub struct ImportedNode {
    pub meshes: Vec<ImportedMesh>,
    pub children: Vec<ImportedNode>,
}

/// Texture references of one material.
#[derive(Debug, Clone, Default)]
pub struct ImportedMaterial {
    pub diffuse_texture: Option<String>,
    pub specular_texture: Option<String>,
}

/// A complete imported asset.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub root: ImportedNode,
    pub materials: Vec<ImportedMaterial>,
}

/// A 3D asset file parser.
pub trait Importer {
    fn import(&self, path: &str) -> Result<ImportedScene, EngineError>;
}

/// OBJ/MTL importer built on `tobj`.
#[derive(Debug, Default)]
pub struct ObjImporter;

impl ObjImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Importer for ObjImporter {
    fn import(&self, path: &str) -> Result<ImportedScene, EngineError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| EngineError::ResourceNotFound {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!("no MTL file for {}: {}", path, e);
            Vec::new()
        });

        let mut root = ImportedNode::default();
        for model in &models {
            let mesh = &model.mesh;
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();

            let normals: Vec<[f32; 3]> = if mesh.normals.is_empty() {
                compute_vertex_normals(&positions, &mesh.indices)
            } else {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            };

            // Flip V to the engine's vertical convention.
            let tex_coords = if mesh.texcoords.is_empty() {
                None
            } else {
                Some(
                    mesh.texcoords
                        .chunks_exact(2)
                        .map(|t| [t[0], 1.0 - t[1]])
                        .collect(),
                )
            };

            root.meshes.push(ImportedMesh {
                positions,
                normals,
                tex_coords,
                faces: mesh.indices.chunks(3).map(|f| f.to_vec()).collect(),
                material: mesh.material_id,
            });
        }

        Ok(ImportedScene {
            root,
            materials: materials
                .iter()
                .map(|m| ImportedMaterial {
                    diffuse_texture: m.diffuse_texture.clone(),
                    specular_texture: m.specular_texture.clone(),
                })
                .collect(),
        })
    }
}

/// Averages face normals per vertex for meshes that ship without normals.
fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector3::zero(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}
