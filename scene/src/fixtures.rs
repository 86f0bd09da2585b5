//! Canned courtroom models and asset sources for tests.
//!
//! Compiled for this crate's unit tests and, behind the `test-fixtures`
//! feature, for integration tests of this and downstream crates.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::assets::{AssetFuture, AssetSource, MemoryAssets};

/// Minimal glTF JSON: one named root node with a mesh per entry in `nodes`
/// and one animation per entry in `clips` (name, end time).
///
/// Accessor 0 holds the shared positions; accessor `i + 1` is the
/// keyframe input of clip `i`. The buffer has no data, so meshes decode
/// without geometry.
pub fn gltf_json(nodes: &[&str], clips: &[(&str, f32)]) -> Vec<u8> {
    let node_json: Vec<String> = nodes
        .iter()
        .enumerate()
        .map(|(i, name)| format!(r#"{{"name":"{name}","mesh":{i}}}"#))
        .collect();
    let mesh_json: Vec<String> = nodes
        .iter()
        .map(|name| {
            format!(r#"{{"name":"{name}Mesh","primitives":[{{"attributes":{{"POSITION":0}}}}]}}"#)
        })
        .collect();
    let root_indices: Vec<String> = (0..nodes.len()).map(|i| i.to_string()).collect();

    let mut accessors = vec![
        r#"{"bufferView":0,"componentType":5126,"count":1,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,1.0]}"#
            .to_owned(),
    ];
    accessors.extend(clips.iter().map(|(_, end)| {
        format!(
            r#"{{"bufferView":0,"componentType":5126,"count":2,"type":"SCALAR","min":[0.0],"max":[{end:?}]}}"#
        )
    }));
    let animations: Vec<String> = clips
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            let input = i + 1;
            format!(
                r#"{{"name":"{name}","samplers":[{{"input":{input},"output":0,"interpolation":"LINEAR"}}],"channels":[{{"sampler":0,"target":{{"node":0,"path":"translation"}}}}]}}"#
            )
        })
        .collect();

    let mut json = format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[{}]}}],"nodes":[{}],"meshes":[{}],"buffers":[{{"byteLength":16}}],"bufferViews":[{{"buffer":0,"byteLength":16}}],"accessors":[{}]"#,
        root_indices.join(","),
        node_json.join(","),
        mesh_json.join(","),
        accessors.join(","),
    );
    if !clips.is_empty() {
        json.push_str(&format!(r#","animations":[{}]"#, animations.join(",")));
    }
    json.push('}');
    json.into_bytes()
}

/// Binary glTF holding one root node `node` whose mesh `{node}Mesh` is the
/// indexed triangle (0,0,0) (1,0,0) (0,1,0).
pub fn triangle_glb(node: &str) -> Vec<u8> {
    const GLB_MAGIC: u32 = 0x4654_6C67;
    const CHUNK_JSON: u32 = 0x4E4F_534A;
    const CHUNK_BIN: u32 = 0x004E_4942;

    let json = format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"nodes":[{{"name":"{node}","mesh":0}}],"meshes":[{{"name":"{node}Mesh","primitives":[{{"attributes":{{"POSITION":0}},"indices":1}}]}}],"buffers":[{{"byteLength":42}}],"bufferViews":[{{"buffer":0,"byteLength":36}},{{"buffer":0,"byteOffset":36,"byteLength":6}}],"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}},{{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}}]}}"#
    );
    let mut json = json.into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let mut bin = Vec::with_capacity(44);
    for position in [[0.0_f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in [0_u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&2_u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);
    glb
}

/// The three courtroom models at their default paths. The judge has
/// `Idle` (3s) and `Talking` (1.5s) clips.
pub fn courtroom_assets() -> MemoryAssets {
    let assets = MemoryAssets::new();
    assets.insert("models/environment.glb", triangle_glb("Courtroom"));
    assets.insert(
        "models/judge.glb",
        gltf_json(&["Judge"], &[("Idle", 3.0), ("Talking", 1.5)]),
    );
    assets.insert("models/person.glb", gltf_json(&["Person"], &[]));
    assets
}

/// Asset source whose reads stay pending until the gate is opened.
pub struct GatedAssets {
    inner: MemoryAssets,
    open: Arc<AtomicBool>,
}

impl GatedAssets {
    /// The source and the flag that opens it.
    pub fn new(inner: MemoryAssets) -> (Self, Arc<AtomicBool>) {
        let open = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner,
                open: open.clone(),
            },
            open,
        )
    }
}

impl AssetSource for GatedAssets {
    fn read(&self, path: &str) -> AssetFuture<Vec<u8>> {
        Box::pin(Gated {
            inner: self.inner.read(path),
            open: self.open.clone(),
        })
    }

    fn describe(&self) -> String {
        "gated memory".into()
    }
}

struct Gated<T> {
    inner: AssetFuture<T>,
    open: Arc<AtomicBool>,
}

impl<T> Future for Gated<T> {
    type Output = <AssetFuture<T> as Future>::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.open.load(Ordering::Acquire) {
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        self.inner.as_mut().poll(cx)
    }
}
