//! glTF model decoding.
//!
//! The courtroom needs what the scene graph, animation player and engine
//! use: root node names, animation clips with their durations and the
//! triangle geometry of each mesh. Materials and skins are not read.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse model {model}: {source}")]
    Parse {
        model: String,
        #[source]
        source: gltf::Error,
    },
    #[error("model {model} has no animation at index {index}")]
    MissingAnimation { model: String, index: usize },
}

/// Triangle geometry of one glTF mesh with all its primitives merged.
///
/// `indices` always holds whole triangles into `positions`. A mesh whose
/// buffers were not embedded decodes with no geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A named animation and its length in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
}

/// A decoded glTF/GLB model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    name: String,
    meshes: Vec<Arc<MeshData>>,
    root_nodes: Vec<String>,
    animations: Vec<AnimationClip>,
}

impl ModelAsset {
    /// Parse a `.gltf` (JSON) or `.glb` (binary) document.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self, ModelError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| ModelError::Parse {
            model: name.to_owned(),
            source,
        })?;
        let document = &gltf.document;

        // Only the GLB binary chunk is available; external buffers are skipped.
        let buffers: Vec<Option<&[u8]>> = document
            .buffers()
            .map(|buffer| match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .as_deref()
                    .filter(|blob| blob.len() >= buffer.length()),
                gltf::buffer::Source::Uri(uri) => {
                    log::warn!("model {name}: external buffer {uri:?} is not loaded");
                    None
                }
            })
            .collect();

        let meshes = document
            .meshes()
            .map(|mesh| Arc::new(read_mesh(name, &mesh, &buffers)))
            .collect();

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        let root_nodes = match scene {
            Some(scene) => scene.nodes().map(|node| node_name(name, &node)).collect(),
            None => Vec::new(),
        };

        let animations = document
            .animations()
            .map(|animation| AnimationClip {
                name: animation
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("{name}.anim{}", animation.index())),
                duration: clip_duration(&animation),
            })
            .collect();

        let model = Self {
            name: name.to_owned(),
            meshes,
            root_nodes,
            animations,
        };
        log::debug!(
            "decoded model {}: {} meshes, {} triangles, {} animations",
            model.name,
            model.meshes.len(),
            model.meshes.iter().map(|mesh| mesh.triangle_count()).sum::<usize>(),
            model.animations.len()
        );
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Arc<MeshData>] {
        &self.meshes
    }

    pub fn mesh_names(&self) -> Vec<&str> {
        self.meshes.iter().map(|mesh| mesh.name.as_str()).collect()
    }

    pub fn root_nodes(&self) -> &[String] {
        &self.root_nodes
    }

    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    /// The clip at `index`, or [`ModelError::MissingAnimation`].
    pub fn animation(&self, index: usize) -> Result<&AnimationClip, ModelError> {
        self.animations
            .get(index)
            .ok_or_else(|| ModelError::MissingAnimation {
                model: self.name.clone(),
                index,
            })
    }
}

fn node_name(model: &str, node: &gltf::Node<'_>) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{model}.node{}", node.index()))
}

/// Merge the triangle primitives of `mesh`. Primitives with another
/// topology, missing positions or out-of-range indices are skipped.
fn read_mesh(model: &str, mesh: &gltf::Mesh<'_>, buffers: &[Option<&[u8]>]) -> MeshData {
    let mut data = MeshData {
        name: mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{model}.mesh{}", mesh.index())),
        ..MeshData::default()
    };

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("mesh {}: skipping {:?} primitive", data.name, primitive.mode());
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).copied().flatten());
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let count = positions.len() as u32;
        let mut indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };
        if indices.iter().any(|&index| index >= count) {
            log::warn!("mesh {}: primitive index out of range, skipped", data.name);
            continue;
        }
        indices.truncate(indices.len() - indices.len() % 3);

        let base = data.positions.len() as u32;
        data.positions.extend(positions);
        data.indices.extend(indices.into_iter().map(|index| base + index));
    }
    data
}

/// Latest keyframe time across the clip's channels.
fn clip_duration(animation: &gltf::Animation<'_>) -> f32 {
    animation
        .channels()
        .filter_map(|channel| {
            let max = channel.sampler().input().max()?;
            max.as_array()?.first()?.as_f64()
        })
        .fold(0.0_f32, |longest, end| longest.max(end as f32))
}
