//! Binary glTF 2.0 (GLB) reader.
//!
//! Reads only what the scene needs: the node hierarchy of one scene, the
//! triangle geometry (positions, normals, first UV set, indices) of every mesh
//! primitive, and its base color factor and embedded base color image.
//! Other material channels, animations and skins are ignored. Buffers and
//! images must be embedded in the BIN chunk.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

use crate::api::error::GlbError;
use crate::components::mesh::{MeshGeometry, MeshMaterial, MeshNode, TextureImage};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_BYTES: usize = 12;
const CHUNK_HEADER_BYTES: usize = 8;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;
const MODE_TRIANGLES: u32 = 4;

/// A decoded model: every mesh primitive as a node with its model-space transform.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub nodes: Vec<MeshNode>,
}

impl ModelAsset {
    pub fn mesh_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes.iter().map(|n| n.geometry.vertex_count()).sum()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Document {
    scene: Option<usize>,
    scenes: Vec<SceneDef>,
    nodes: Vec<NodeDef>,
    meshes: Vec<MeshDef>,
    accessors: Vec<AccessorDef>,
    buffer_views: Vec<BufferViewDef>,
    buffers: Vec<BufferDef>,
    materials: Vec<MaterialDef>,
    textures: Vec<TextureDef>,
    images: Vec<ImageDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SceneDef {
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeDef {
    name: Option<String>,
    mesh: Option<usize>,
    children: Vec<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeshDef {
    name: Option<String>,
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MaterialDef {
    name: Option<String>,
    pbr_metallic_roughness: Option<PbrDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PbrDef {
    base_color_factor: Option<[f32; 4]>,
    base_color_texture: Option<TextureRefDef>,
}

#[derive(Debug, Deserialize)]
struct TextureRefDef {
    index: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextureDef {
    source: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageDef {
    buffer_view: Option<usize>,
    mime_type: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    byte_length: usize,
    uri: Option<String>,
}

// glTF data is little-endian, as are all targets this crate ships to.
fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, GlbError> {
    bytes
        .get(offset..offset + 4)
        .map(bytemuck::pod_read_unaligned::<u32>)
        .ok_or(GlbError::Truncated(bytes.len()))
}

/// Split a GLB file into its JSON and optional BIN chunk.
fn split_chunks(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>), GlbError> {
    if bytes.len() < HEADER_BYTES + CHUNK_HEADER_BYTES {
        return Err(GlbError::Truncated(bytes.len()));
    }
    let magic = read_u32(bytes, 0)?;
    if magic != GLB_MAGIC {
        return Err(GlbError::BadMagic(magic));
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(GlbError::UnsupportedVersion(version));
    }
    let total = (read_u32(bytes, 8)? as usize).min(bytes.len());

    let mut offset = HEADER_BYTES;
    let mut json = None;
    let mut bin = None;
    while offset + CHUNK_HEADER_BYTES <= total {
        let len = read_u32(bytes, offset)? as usize;
        let kind = read_u32(bytes, offset + 4)?;
        let start = offset + CHUNK_HEADER_BYTES;
        let end = start.checked_add(len).filter(|&e| e <= total).ok_or(GlbError::ChunkOverrun(offset))?;
        match kind {
            CHUNK_JSON if json.is_none() => json = Some(&bytes[start..end]),
            CHUNK_BIN if bin.is_none() => bin = Some(&bytes[start..end]),
            _ => {}
        }
        if json.is_none() {
            return Err(GlbError::MissingJson);
        }
        // Chunks are 4-byte aligned.
        offset = (end + 3) & !3;
    }

    Ok((json.ok_or(GlbError::MissingJson)?, bin))
}

fn node_transform(node: &NodeDef) -> Mat4 {
    if let Some(m) = node.matrix {
        return Mat4::from_cols_array(&m);
    }
    let translation = node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO);
    let rotation = node.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY);
    let scale = node.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

fn components_per_element(kind: &str) -> Option<usize> {
    match kind {
        "SCALAR" => Some(1),
        "VEC2" => Some(2),
        "VEC3" => Some(3),
        "VEC4" => Some(4),
        _ => None,
    }
}

fn component_size(component_type: u32) -> Option<usize> {
    match component_type {
        COMPONENT_U8 => Some(1),
        COMPONENT_U16 => Some(2),
        COMPONENT_U32 | COMPONENT_F32 => Some(4),
        _ => None,
    }
}

struct Reader<'a> {
    doc: &'a Document,
    bin: Option<&'a [u8]>,
}

impl<'a> Reader<'a> {
    /// Bytes of a buffer view inside the BIN chunk.
    fn view(&self, view_index: usize) -> Result<(&'a BufferViewDef, &'a [u8]), GlbError> {
        let view = self
            .doc
            .buffer_views
            .get(view_index)
            .ok_or(GlbError::BadIndex { kind: "bufferView", index: view_index })?;
        let buffer = self
            .doc
            .buffers
            .get(view.buffer)
            .ok_or(GlbError::BadIndex { kind: "buffer", index: view.buffer })?;
        // Only the first buffer may live in the BIN chunk.
        if view.buffer != 0 || buffer.uri.is_some() {
            return Err(GlbError::MissingBuffer(view.buffer));
        }
        let bin = self.bin.ok_or(GlbError::MissingBuffer(view.buffer))?;
        let bin = &bin[..buffer.byte_length.min(bin.len())];

        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .filter(|&e| e <= bin.len())
            .ok_or(GlbError::ViewOverrun(view_index))?;
        let view_bytes = &bin[view.byte_offset..view_end];
        Ok((view, view_bytes))
    }

    /// Yield the byte slice of every element of an accessor.
    fn elements(&self, index: usize) -> Result<Vec<&'a [u8]>, GlbError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "accessor", index })?;
        let comps = components_per_element(&accessor.kind).ok_or(GlbError::UnsupportedAccessor(index))?;
        let size = component_size(accessor.component_type).ok_or(GlbError::UnsupportedAccessor(index))?;
        let elem_bytes = comps * size;

        // Sparse-only accessors without a view read as zeros; we don't use them.
        let view_index = accessor.buffer_view.ok_or(GlbError::UnsupportedAccessor(index))?;
        let (view, view_bytes) = self.view(view_index).map_err(|e| match e {
            GlbError::ViewOverrun(_) => GlbError::AccessorOverrun(index),
            other => other,
        })?;
        let stride = view.byte_stride.unwrap_or(elem_bytes).max(elem_bytes);

        // The last element only needs `elem_bytes`, not a full stride.
        let overrun = GlbError::AccessorOverrun(index);
        let span = match accessor.count {
            0 => Some(0),
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|s| s.checked_add(elem_bytes)),
        };
        let end = span
            .and_then(|s| s.checked_add(accessor.byte_offset))
            .filter(|&e| e <= view_bytes.len())
            .ok_or(overrun)?;
        let data = &view_bytes[accessor.byte_offset..end];

        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let start = i * stride;
            out.push(&data[start..start + elem_bytes]);
        }
        Ok(out)
    }

    fn read_vec3_f32(&self, index: usize) -> Result<Vec<[f32; 3]>, GlbError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "accessor", index })?;
        if accessor.component_type != COMPONENT_F32 || accessor.kind != "VEC3" {
            return Err(GlbError::UnsupportedAccessor(index));
        }
        Ok(self
            .elements(index)?
            .into_iter()
            .map(bytemuck::pod_read_unaligned::<[f32; 3]>)
            .collect())
    }

    fn read_indices(&self, index: usize) -> Result<Vec<u32>, GlbError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "accessor", index })?;
        if accessor.kind != "SCALAR" {
            return Err(GlbError::UnsupportedAccessor(index));
        }
        let component_type = accessor.component_type;
        self.elements(index)?
            .into_iter()
            .map(|e| match component_type {
                COMPONENT_U8 => Ok(e[0] as u32),
                COMPONENT_U16 => Ok(bytemuck::pod_read_unaligned::<u16>(e) as u32),
                COMPONENT_U32 => Ok(bytemuck::pod_read_unaligned::<u32>(e)),
                _ => Err(GlbError::UnsupportedAccessor(index)),
            })
            .collect()
    }

    /// First UV set; integer components are normalized to `0..=1`.
    fn read_uvs(&self, index: usize) -> Result<Vec<[f32; 2]>, GlbError> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "accessor", index })?;
        if accessor.kind != "VEC2" {
            return Err(GlbError::UnsupportedAccessor(index));
        }
        let component_type = accessor.component_type;
        self.elements(index)?
            .into_iter()
            .map(|e| match component_type {
                COMPONENT_F32 => Ok(bytemuck::pod_read_unaligned::<[f32; 2]>(e)),
                COMPONENT_U8 => Ok([e[0] as f32 / 255.0, e[1] as f32 / 255.0]),
                COMPONENT_U16 => {
                    let [u, v] = bytemuck::pod_read_unaligned::<[u16; 2]>(e);
                    Ok([u as f32 / 65535.0, v as f32 / 65535.0])
                }
                _ => Err(GlbError::UnsupportedAccessor(index)),
            })
            .collect()
    }

    fn material(&self, index: usize) -> Result<MeshMaterial, GlbError> {
        let def = self
            .doc
            .materials
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "material", index })?;
        let pbr = def.pbr_metallic_roughness.as_ref();
        let base_color_texture = match pbr.and_then(|p| p.base_color_texture.as_ref()) {
            Some(texture) => self.texture_image(texture.index)?,
            None => None,
        };
        Ok(MeshMaterial {
            name: def.name.clone().unwrap_or_default(),
            base_color: pbr.and_then(|p| p.base_color_factor).unwrap_or([1.0; 4]),
            base_color_texture,
        })
    }

    /// Image bytes behind a texture. Images referenced by URI are skipped.
    fn texture_image(&self, index: usize) -> Result<Option<TextureImage>, GlbError> {
        let texture = self
            .doc
            .textures
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "texture", index })?;
        let Some(source) = texture.source else {
            return Ok(None);
        };
        let image = self
            .doc
            .images
            .get(source)
            .ok_or(GlbError::BadIndex { kind: "image", index: source })?;
        let Some(view_index) = image.buffer_view else {
            log::debug!("image {} is not embedded (uri {:?})", source, image.uri);
            return Ok(None);
        };
        let (_, bytes) = self.view(view_index)?;
        Ok(Some(TextureImage {
            mime_type: image
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: bytes.to_vec(),
        }))
    }

    fn mesh_nodes(&self, node: &NodeDef, transform: Mat4) -> Result<Vec<MeshNode>, GlbError> {
        let Some(mesh_index) = node.mesh else {
            return Ok(Vec::new());
        };
        let mesh = self
            .doc
            .meshes
            .get(mesh_index)
            .ok_or(GlbError::BadIndex { kind: "mesh", index: mesh_index })?;
        let name = node
            .name
            .clone()
            .or_else(|| mesh.name.clone())
            .unwrap_or_default();

        let mut out = Vec::with_capacity(mesh.primitives.len());
        for prim in &mesh.primitives {
            let mode = prim.mode.unwrap_or(MODE_TRIANGLES);
            if mode != MODE_TRIANGLES {
                return Err(GlbError::UnsupportedMode(mode));
            }
            let Some(&position_index) = prim.attributes.get("POSITION") else {
                log::debug!("skipping primitive without POSITION in mesh '{}'", name);
                continue;
            };
            let positions = self.read_vec3_f32(position_index)?;
            let indices = prim.indices.map(|i| self.read_indices(i)).transpose()?;
            let mut geometry = MeshGeometry::new(positions, indices);
            if let Some(&normal_index) = prim.attributes.get("NORMAL") {
                geometry.normals = self.read_vec3_f32(normal_index)?;
            }
            if let Some(&uv_index) = prim.attributes.get("TEXCOORD_0") {
                geometry.uvs = self.read_uvs(uv_index)?;
            }
            let material = prim.material.map(|m| self.material(m)).transpose()?.unwrap_or_default();
            out.push(MeshNode::new(name.clone(), transform, geometry).with_material(material));
        }
        Ok(out)
    }
}

/// Decode a GLB file into its mesh nodes, flattened to model space.
pub fn parse_glb(bytes: &[u8]) -> Result<ModelAsset, GlbError> {
    let (json, bin) = split_chunks(bytes)?;
    let doc: Document = serde_json::from_slice(json)?;
    let reader = Reader { doc: &doc, bin };

    let roots: Vec<usize> = match doc.scene.or(if doc.scenes.is_empty() { None } else { Some(0) }) {
        Some(s) => doc
            .scenes
            .get(s)
            .ok_or(GlbError::BadIndex { kind: "scene", index: s })?
            .nodes
            .clone(),
        None => root_nodes(&doc),
    };

    let mut model = ModelAsset::default();
    // Each node is expanded once, so cycles and shared children cannot blow up.
    let mut visited = vec![false; doc.nodes.len()];
    let mut stack: Vec<(usize, Mat4)> = roots.into_iter().rev().map(|n| (n, Mat4::IDENTITY)).collect();
    while let Some((index, parent)) = stack.pop() {
        let node = doc
            .nodes
            .get(index)
            .ok_or(GlbError::BadIndex { kind: "node", index })?;
        if std::mem::replace(&mut visited[index], true) {
            continue;
        }
        let world = parent * node_transform(node);
        model.nodes.extend(reader.mesh_nodes(node, world)?);
        for &child in node.children.iter().rev() {
            stack.push((child, world));
        }
    }
    Ok(model)
}

/// Nodes that are nobody's child.
fn root_nodes(doc: &Document) -> Vec<usize> {
    let mut is_child = vec![false; doc.nodes.len()];
    for node in &doc.nodes {
        for &c in &node.children {
            if let Some(flag) = is_child.get_mut(c) {
                *flag = true;
            }
        }
    }
    (0..doc.nodes.len()).filter(|&i| !is_child[i]).collect()
}
