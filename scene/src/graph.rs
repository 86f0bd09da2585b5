//! Scene graph the courtroom is assembled into.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Ids are
//! only meaningful for the graph that issued them; after [`SceneGraph::clear`]
//! old ids are ignored by every setter.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::model::{MeshData, ModelAsset};

/// Index of a node in its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    /// Geometry drawn at this node, shared with the model it came from.
    pub mesh: Option<Arc<MeshData>>,
    pub enabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(
        name: impl Into<String>,
        mesh: Option<Arc<MeshData>>,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh,
            enabled: true,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A mesh to draw this frame and where.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance<'a> {
    pub node: NodeId,
    pub mesh: &'a Arc<MeshData>,
    pub world: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Sky/ground light; `direction` points toward the sky colour.
    Hemispheric { direction: Vec3 },
    /// Parallel rays travelling along `direction`.
    Directional { direction: Vec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub intensity: f32,
}

/// Coordinate system convention used by the camera projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handedness {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    lights: Vec<Light>,
    /// RGBA colour the frame is cleared to.
    pub clear_color: [f32; 4],
    pub ambient_color: [f32; 3],
    pub handedness: Handedness,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            lights: Vec::new(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            ambient_color: [0.0, 0.0, 0.0],
            handedness: Handedness::Left,
        }
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty node under `parent` (or at the root).
    pub fn add_group(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        self.push_node(Node::new(name, None, parent))
    }

    /// Add `model` as one group named `name` with a child per mesh.
    pub fn add_model(&mut self, name: impl Into<String>, model: &ModelAsset) -> NodeId {
        let root = self.add_group(name, None);
        for mesh in model.meshes() {
            self.push_node(Node::new(mesh.name.clone(), Some(mesh.clone()), Some(root)));
        }
        root
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        match node.parent {
            Some(parent) => match self.nodes.get_mut(parent.0) {
                Some(parent) => parent.children.push(id),
                None => {
                    log::warn!("node {:?} added under unknown parent", node.name);
                    self.nodes.push(Node {
                        parent: None,
                        ..node
                    });
                    self.roots.push(id);
                    return id;
                }
            },
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    /// Deep-copy `source` and its descendants as a sibling named `name`.
    pub fn clone_subtree(&mut self, source: NodeId, name: impl Into<String>) -> Option<NodeId> {
        let parent = self.nodes.get(source.0)?.parent;
        let copy = self.copy_node(source, parent)?;
        self.nodes[copy.0].name = name.into();
        Some(copy)
    }

    fn copy_node(&mut self, source: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let original = self.nodes.get(source.0)?;
        let children = original.children.clone();
        let node = Node {
            parent,
            children: Vec::new(),
            ..original.clone()
        };
        let id = self.push_node(node);
        for child in children {
            self.copy_node(child, Some(id));
        }
        Some(id)
    }

    /// First node named `name`, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rotate around the Y axis by `angle` radians, on top of the current rotation.
    pub fn rotate_y(&mut self, id: NodeId, angle: f32) {
        if let Some(node) = self.node_mut(id) {
            node.transform.rotation = Quat::from_rotation_y(angle) * node.transform.rotation;
        }
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.translation = translation;
        }
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.scale = scale;
        }
    }

    pub fn set_uniform_scale(&mut self, id: NodeId, scale: f32) {
        self.set_scale(id, Vec3::splat(scale));
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        if let Some(node) = self.node_mut(id) {
            node.enabled = enabled;
        }
    }

    /// Whether the node and all of its ancestors are enabled.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.nodes.get(id.0) {
                Some(node) if node.enabled => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.0) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Visible nodes carrying non-empty geometry, in insertion order.
    pub fn visible_meshes(&self) -> Vec<MeshInstance<'_>> {
        self.nodes()
            .filter_map(|(id, node)| {
                let mesh = node.mesh.as_ref().filter(|mesh| !mesh.is_empty())?;
                self.is_visible(id).then(|| MeshInstance {
                    node: id,
                    mesh,
                    world: self.world_matrix(id),
                })
            })
            .collect()
    }

    pub fn add_light(&mut self, name: impl Into<String>, kind: LightKind, intensity: f32) {
        self.lights.push(Light {
            name: name.into(),
            kind,
            intensity,
        });
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Remove every node and light and restore default colours.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
