//! # Model
//!
//! A named 3D asset: the meshes produced from an imported node tree, the
//! texture set those meshes reference (drawn from the shared cache, not owned
//! exclusively), and one owned shader. Loading walks the importer's tree
//! recursively; an unreadable or structurally-empty asset degrades to a model
//! with zero meshes, which renders as a no-op.
//!
//! After all meshes are processed the texture set is bound into the shader
//! under the fixed material naming convention
//! `u_material.texture_<diffuse|specular><N>`, with `N` counting per kind
//! from zero and the sampler value being the texture's unit (its position in
//! the model's texture list).

use log::warn;

use crate::gfx::backend::GraphicsBackend;
use crate::gfx::error::EngineError;
use crate::gfx::resources::importer::{ImportedMaterial, ImportedNode, Importer};
use crate::gfx::resources::mesh::{Mesh, Vertex3D};
use crate::gfx::resources::shader::Shader;
use crate::gfx::resources::texture::{TextureCache, TextureHandle, TextureKind};

/// A named, drawable 3D asset.
pub struct Model {
    name: String,
    meshes: Vec<Mesh>,
    textures: Vec<TextureHandle>,
    shader: Shader,
}

impl Model {
    /// Imports `path`, uploads its meshes, resolves its textures through the
    /// cache, and binds the texture set into a freshly loaded shader.
    ///
    /// Importer failures are not errors: they produce an empty model. Only
    /// the fatal shader paths propagate.
    pub fn load<B: GraphicsBackend>(
        backend: &mut B,
        cache: &mut TextureCache,
        importer: &dyn Importer,
        name: &str,
        path: &str,
        shader_path: &str,
    ) -> Result<Self, EngineError> {
        let shader = Shader::load(backend, shader_path)?;
        let mut model = Self {
            name: name.to_string(),
            meshes: Vec::new(),
            textures: Vec::new(),
            shader,
        };

        match importer.import(path) {
            Ok(scene) => {
                model.collect_node(backend, cache, &scene.root, &scene.materials);
            }
            Err(e) => {
                warn!("asset {} could not be imported ({}); model '{}' is empty", path, e, name);
            }
        }

        model.bind_texture_uniforms(backend, cache);
        Ok(model)
    }

    /// Builds an asset-less model around existing meshes. The shader path
    /// may be empty for the embedded fallback program.
    pub fn from_meshes<B: GraphicsBackend>(
        backend: &mut B,
        name: &str,
        meshes: Vec<Mesh>,
        shader_path: &str,
    ) -> Result<Self, EngineError> {
        let shader = Shader::load(backend, shader_path)?;
        Ok(Self {
            name: name.to_string(),
            meshes,
            textures: Vec::new(),
            shader,
        })
    }

    fn collect_node<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        cache: &mut TextureCache,
        node: &ImportedNode,
        materials: &[ImportedMaterial],
    ) {
        for imported in &node.meshes {
            let vertices: Vec<Vertex3D> = imported
                .positions
                .iter()
                .zip(&imported.normals)
                .enumerate()
                .map(|(i, (&position, &normal))| Vertex3D {
                    position,
                    normal,
                    tex_coords: imported
                        .tex_coords
                        .as_ref()
                        .and_then(|uvs| uvs.get(i).copied())
                        .unwrap_or([0.0, 0.0]),
                })
                .collect();

            // Flatten per-face index groups into one triangle list.
            let indices: Vec<u32> = imported.faces.iter().flatten().copied().collect();

            self.meshes.push(Mesh::new(backend, &vertices, &indices));

            if let Some(material) = imported.material.and_then(|i| materials.get(i)) {
                self.resolve_material(backend, cache, material);
            }
        }

        for child in &node.children {
            self.collect_node(backend, cache, child, materials);
        }
    }

    fn resolve_material<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        cache: &mut TextureCache,
        material: &ImportedMaterial,
    ) {
        let references = [
            (&material.diffuse_texture, TextureKind::Diffuse),
            (&material.specular_texture, TextureKind::Specular),
        ];
        for (path, kind) in references {
            let Some(path) = path else { continue };
            match cache.load_or_reuse(backend, path, kind) {
                // The model-level dedup: the importer may list the same
                // cache entry from several meshes.
                Ok(handle) => {
                    if !self.textures.contains(&handle) {
                        self.textures.push(handle);
                    }
                }
                Err(e) => warn!("texture {} skipped for model '{}': {}", path, self.name, e),
            }
        }
    }

    fn bind_texture_uniforms<B: GraphicsBackend>(&mut self, backend: &mut B, cache: &TextureCache) {
        let mut diffuse_count = 0;
        let mut specular_count = 0;
        for (unit, &handle) in self.textures.iter().enumerate() {
            let Some(texture) = cache.get(handle) else { continue };
            let index = match texture.kind {
                TextureKind::Diffuse => {
                    diffuse_count += 1;
                    diffuse_count - 1
                }
                TextureKind::Specular => {
                    specular_count += 1;
                    specular_count - 1
                }
            };
            let name = format!(
                "u_material.texture_{}{}",
                texture.kind.uniform_suffix(),
                index
            );
            self.shader.set_int(backend, &name, unit as i32);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        let mesh = self.meshes.get(index);
        if mesh.is_none() {
            warn!("mesh lookup out of range on model '{}': {}", self.name, index);
        }
        mesh
    }

    /// Handles into the shared texture cache, in binding-unit order.
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    pub fn shader_mut(&mut self) -> &mut Shader {
        &mut self.shader
    }

    /// True for models whose asset failed to import; drawing them is a no-op.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Releases every mesh and the shader. The backend must still be alive.
    pub fn destroy<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for mesh in &mut self.meshes {
            mesh.destroy(backend);
        }
        self.shader.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{RecordingBackend, UniformValue};
    use crate::gfx::resources::importer::{ImportedMesh, ImportedScene};

    /// Importer that hands back a fixed tree, for exercising the loader
    /// without files on disk.
    struct FixedImporter(ImportedScene);

    impl Importer for FixedImporter {
        fn import(&self, _path: &str) -> Result<ImportedScene, EngineError> {
            Ok(self.0.clone())
        }
    }

    struct FailingImporter;

    impl Importer for FailingImporter {
        fn import(&self, path: &str) -> Result<ImportedScene, EngineError> {
            Err(EngineError::ResourceNotFound {
                path: path.to_string(),
                reason: "gone".to_string(),
            })
        }
    }

    fn triangle_mesh(material: Option<usize>) -> ImportedMesh {
        ImportedMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: None,
            faces: vec![vec![0, 1, 2]],
            material,
        }
    }

    fn write_test_png(name: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([128, 128, 128, 255]));
        img.save(&path).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn missing_asset_yields_an_empty_model() {
        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new();
        let model = Model::load(
            &mut backend,
            &mut cache,
            &FailingImporter,
            "ghost",
            "gone.obj",
            "",
        )
        .unwrap();
        assert!(model.is_empty());
        assert!(model.textures().is_empty());
    }

    #[test]
    fn child_nodes_are_walked_recursively() {
        let scene = ImportedScene {
            root: ImportedNode {
                meshes: vec![triangle_mesh(None)],
                children: vec![ImportedNode {
                    meshes: vec![triangle_mesh(None)],
                    children: vec![ImportedNode {
                        meshes: vec![triangle_mesh(None)],
                        children: vec![],
                    }],
                }],
            },
            materials: vec![],
        };

        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new();
        let model = Model::load(
            &mut backend,
            &mut cache,
            &FixedImporter(scene),
            "nested",
            "nested.obj",
            "",
        )
        .unwrap();
        assert_eq!(model.meshes().len(), 3);
    }

    #[test]
    fn redundant_texture_references_are_deduplicated_per_model() {
        let diffuse = write_test_png("cairn_model_diffuse.png");
        // Two meshes pointing at the same material, which itself repeats the
        // same file for both slots.
        let scene = ImportedScene {
            root: ImportedNode {
                meshes: vec![triangle_mesh(Some(0)), triangle_mesh(Some(0))],
                children: vec![],
            },
            materials: vec![ImportedMaterial {
                diffuse_texture: Some(diffuse.clone()),
                specular_texture: Some(diffuse.clone()),
            }],
        };

        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new();
        let model = Model::load(
            &mut backend,
            &mut cache,
            &FixedImporter(scene),
            "crate",
            "crate.obj",
            "",
        )
        .unwrap();

        assert_eq!(model.textures().len(), 1);
        assert_eq!(backend.texture_upload_count(), 1);
    }

    #[test]
    fn texture_set_binds_with_per_kind_counters() {
        let diffuse_a = write_test_png("cairn_model_d0.png");
        let diffuse_b = write_test_png("cairn_model_d1.png");
        let specular = write_test_png("cairn_model_s0.png");
        let scene = ImportedScene {
            root: ImportedNode {
                meshes: vec![triangle_mesh(Some(0)), triangle_mesh(Some(1))],
                children: vec![],
            },
            materials: vec![
                ImportedMaterial {
                    diffuse_texture: Some(diffuse_a),
                    specular_texture: Some(specular),
                },
                ImportedMaterial {
                    diffuse_texture: Some(diffuse_b),
                    specular_texture: None,
                },
            ],
        };

        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new();
        let model = Model::load(
            &mut backend,
            &mut cache,
            &FixedImporter(scene),
            "textured",
            "textured.obj",
            "",
        )
        .unwrap();

        let program = model.shader().program();
        // Units follow the texture-list order; indices count per kind.
        assert_eq!(
            backend.uniform(program, "u_material.texture_diffuse0"),
            Some(&UniformValue::Int(0))
        );
        assert_eq!(
            backend.uniform(program, "u_material.texture_specular0"),
            Some(&UniformValue::Int(1))
        );
        assert_eq!(
            backend.uniform(program, "u_material.texture_diffuse1"),
            Some(&UniformValue::Int(2))
        );
        assert!(backend
            .uniform(program, "u_material.texture_specular1")
            .is_none());
    }

    #[test]
    fn missing_texture_is_skipped_not_fatal() {
        let scene = ImportedScene {
            root: ImportedNode {
                meshes: vec![triangle_mesh(Some(0))],
                children: vec![],
            },
            materials: vec![ImportedMaterial {
                diffuse_texture: Some("no/such/texture.png".to_string()),
                specular_texture: None,
            }],
        };

        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new();
        let model = Model::load(
            &mut backend,
            &mut cache,
            &FixedImporter(scene),
            "untextured",
            "untextured.obj",
            "",
        )
        .unwrap();
        assert_eq!(model.meshes().len(), 1);
        assert!(model.textures().is_empty());
    }

    #[test]
    fn out_of_range_mesh_lookup_returns_none() {
        let mut backend = RecordingBackend::new();
        let model = Model::from_meshes(&mut backend, "bare", Vec::new(), "").unwrap();
        assert!(model.mesh(0).is_none());
    }
}
