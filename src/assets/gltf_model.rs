//! glTF import for the rigged fox.
//!
//! Extracts from a `.gltf` document:
//! - the first skinned mesh (all primitives merged into one vertex/index list)
//! - the node tree with rest transforms and the skin's inverse bind matrices
//! - every animation clip
//! - the base color texture of the skinned primitive

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::assets::loader::load_bytes;
use crate::assets::texture::TextureData;
use crate::error::{AssetError, AssetResult};
use crate::model::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::model::rig::{Rig, RigNode, Transform};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct SkinnedMeshData {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct RiggedModel {
    pub mesh: SkinnedMeshData,
    pub rig: Rig,
    pub clips: Vec<AnimationClip>,
    pub base_color: Option<TextureData>,
}

impl RiggedModel {
    /// Build the model from a parsed document. `buffers[i]` holds the bytes of
    /// glTF buffer `i`.
    pub fn from_gltf(
        document: &gltf::Document,
        buffers: &[Vec<u8>],
        base_color: Option<TextureData>,
    ) -> AssetResult<Self> {
        let get_buffer = |b: gltf::Buffer| buffers.get(b.index()).map(|d| d.as_slice());

        let skinned_node = document
            .nodes()
            .find(|n| n.mesh().is_some() && n.skin().is_some())
            .ok_or(AssetError::NoSkinnedMesh)?;
        let (Some(mesh), Some(skin)) = (skinned_node.mesh(), skinned_node.skin()) else {
            return Err(AssetError::NoSkinnedMesh);
        };

        let mut data = SkinnedMeshData::default();
        for primitive in mesh.primitives() {
            append_primitive(&primitive, &get_buffer, &mut data)?;
        }

        let rig = build_rig(document, &skin, &get_buffer);
        let clips: Vec<AnimationClip> = document
            .animations()
            .map(|anim| read_clip(&anim, &get_buffer))
            .collect();

        tracing::info!(
            "loaded rigged model: {} vertices, {} joints, {} clips [{}]",
            data.vertices.len(),
            rig.joint_count(),
            clips.len(),
            clips.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self { mesh: data, rig, clips, base_color })
    }
}

fn append_primitive<'a, F>(
    primitive: &gltf::Primitive,
    get_buffer: &F,
    data: &mut SkinnedMeshData,
) -> AssetResult<()>
where
    F: Clone + Fn(gltf::Buffer) -> Option<&'a [u8]>,
{
    let reader = primitive.reader(get_buffer.clone());

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(AssetError::MissingAttribute("POSITION"))?
        .collect();
    let count = positions.len();

    let joints: Vec<[u16; 4]> = reader
        .read_joints(0)
        .ok_or(AssetError::MissingAttribute("JOINTS_0"))?
        .into_u16()
        .collect();
    let weights: Vec<[f32; 4]> = reader
        .read_weights(0)
        .ok_or(AssetError::MissingAttribute("WEIGHTS_0"))?
        .into_f32()
        .collect();
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; count]);
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..count as u32).collect());
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(n) => n.collect(),
        None => compute_normals(&positions, &indices),
    };

    let base = data.vertices.len() as u32;
    data.vertices.extend((0..count).map(|i| SkinnedVertex {
        pos: positions[i],
        normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        joints: joints.get(i).copied().unwrap_or([0; 4]),
        weights: weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0]),
    }));
    data.indices.extend(indices.iter().map(|i| base + i));
    Ok(())
}

/// Smooth vertex normals from triangle faces.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (Vec3::from(positions[a]), Vec3::from(positions[b]), Vec3::from(positions[c]));
        // Area weighted
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

fn build_rig<'a, F>(document: &gltf::Document, skin: &gltf::Skin, get_buffer: &F) -> Rig
where
    F: Clone + Fn(gltf::Buffer) -> Option<&'a [u8]>,
{
    let mut parents = vec![None; document.nodes().len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }

    let nodes = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            RigNode {
                name: node.name().map(str::to_string),
                parent: parents[node.index()],
                rest: Transform {
                    translation: Vec3::from(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from(s),
                },
            }
        })
        .collect();

    let joints = skin.joints().map(|j| j.index()).collect();
    let inverse_bind = skin
        .reader(get_buffer.clone())
        .read_inverse_bind_matrices()
        .map(|m| m.map(|cols| Mat4::from_cols_array_2d(&cols)).collect())
        .unwrap_or_default();

    Rig::new(nodes, joints, inverse_bind)
}

fn read_clip<'a, F>(anim: &gltf::Animation, get_buffer: &F) -> AnimationClip
where
    F: Clone + Fn(gltf::Buffer) -> Option<&'a [u8]>,
{
    let mut channels = Vec::new();
    for channel in anim.channels() {
        let reader = channel.reader(get_buffer.clone());
        let Some(times) = reader.read_inputs().map(|i| i.collect::<Vec<f32>>()) else {
            continue;
        };
        let cubic = channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline;
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            _ => Interpolation::Linear,
        };

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => {
                ChannelValues::Translation(key_values(v.map(Vec3::from).collect(), cubic))
            }
            Some(ReadOutputs::Rotations(r)) => {
                ChannelValues::Rotation(key_values(r.into_f32().map(Quat::from_array).collect(), cubic))
            }
            Some(ReadOutputs::Scales(v)) => {
                ChannelValues::Scale(key_values(v.map(Vec3::from).collect(), cubic))
            }
            // Morph targets are not animated
            Some(ReadOutputs::MorphTargetWeights(_)) | None => continue,
        };

        channels.push(Channel {
            node: channel.target().node().index(),
            times,
            values,
            interpolation,
        });
    }

    let name = anim.name().map(str::to_string).unwrap_or_else(|| format!("clip{}", anim.index()));
    AnimationClip::new(name, channels)
}

/// Cubic spline samplers store (in-tangent, value, out-tangent) per key; keep the values.
fn key_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn resolve_uri(base: &str, uri: &str) -> AssetResult<String> {
    if uri.starts_with("data:") {
        return Err(AssetError::UnsupportedUri(uri.to_string()));
    }
    Ok(match base.rfind('/') {
        Some(slash) => format!("{}/{}", &base[..slash], uri),
        None => uri.to_string(),
    })
}

/// Fetch a `.gltf` file together with its external buffers and base color image.
pub async fn load_rigged_model(path: &str) -> AssetResult<RiggedModel> {
    let bytes = load_bytes(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;

    let mut buffers = Vec::new();
    for buffer in gltf.document.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => {
                gltf.blob.clone().ok_or(AssetError::MissingBuffer(buffer.index()))?
            }
            gltf::buffer::Source::Uri(uri) => load_bytes(&resolve_uri(path, uri)?).await?,
        };
        buffers.push(data);
    }

    let texture = gltf
        .document
        .nodes()
        .find(|n| n.skin().is_some())
        .and_then(|n| n.mesh())
        .and_then(|m| m.primitives().next())
        .and_then(|p| p.material().pbr_metallic_roughness().base_color_texture())
        .map(|info| info.texture().source());

    let base_color = match texture {
        Some(image) => {
            let name = image.name().unwrap_or("base_color").to_string();
            let image_bytes = match image.source() {
                gltf::image::Source::Uri { uri, .. } => load_bytes(&resolve_uri(path, uri)?).await?,
                gltf::image::Source::View { view, .. } => {
                    let buffer = buffers
                        .get(view.buffer().index())
                        .ok_or(AssetError::MissingBuffer(view.buffer().index()))?;
                    buffer
                        .get(view.offset()..view.offset() + view.length())
                        .ok_or(AssetError::MissingBuffer(view.buffer().index()))?
                        .to_vec()
                }
            };
            Some(TextureData::decode(&name, &image_bytes, true)?)
        }
        None => None,
    };

    RiggedModel::from_gltf(&gltf.document, &buffers, base_color)
}
