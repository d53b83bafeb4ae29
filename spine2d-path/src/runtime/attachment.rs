use crate::{Bone, MeshVertices, PathAttachmentData, Slot};

/// World-space curve geometry a path constraint follows.
///
/// `start`, `count` and `offset` are in floats (two per vertex), matching the layout of
/// [`PathAttachmentData::vertices`].
pub trait PathGeometry {
    fn closed(&self) -> bool;

    fn constant_speed(&self) -> bool;

    fn world_vertices_length(&self) -> usize;

    /// Cumulative length at the end of each curve. Only read when the path is not constant speed.
    fn lengths(&self) -> &[f32];

    /// Writes `count / 2` world vertices starting at vertex `start / 2` into
    /// `out[offset..offset + count]`. `out` must be large enough.
    fn compute_world_vertices(&self, start: usize, count: usize, out: &mut [f32], offset: usize);
}

/// A path attachment bound to the slot displaying it.
#[derive(Copy, Clone, Debug)]
pub struct BoundPath<'a> {
    pub path: &'a PathAttachmentData,
    pub slot: &'a Slot,
    pub bones: &'a [Bone],
}

impl PathGeometry for BoundPath<'_> {
    fn closed(&self) -> bool {
        self.path.closed
    }

    fn constant_speed(&self) -> bool {
        self.path.constant_speed
    }

    fn world_vertices_length(&self) -> usize {
        self.path.world_vertices_length()
    }

    fn lengths(&self) -> &[f32] {
        &self.path.lengths
    }

    fn compute_world_vertices(&self, start: usize, count: usize, out: &mut [f32], offset: usize) {
        compute_world_vertices(
            self.bones,
            self.slot,
            &self.path.vertices,
            start,
            count,
            out,
            offset,
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_world_vertices(
    bones: &[Bone],
    slot: &Slot,
    vertices: &MeshVertices,
    start: usize,
    count: usize,
    out: &mut [f32],
    offset: usize,
) {
    let start_vertex = start / 2;
    let vertex_count = (count / 2).min(out.len().saturating_sub(offset) / 2);
    let deform = slot.deform.as_slice();

    match vertices {
        MeshVertices::Unweighted(v) => {
            let Some(bone) = bones.get(slot.bone) else {
                return;
            };
            let use_deform = deform.len() >= v.len() * 2;
            let n = vertex_count.min(v.len().saturating_sub(start_vertex));
            for i in 0..n {
                let vi = start_vertex + i;
                let (vx, vy) = if use_deform {
                    (deform[vi * 2], deform[vi * 2 + 1])
                } else {
                    (v[vi][0], v[vi][1])
                };
                let w = offset + i * 2;
                out[w] = vx * bone.a + vy * bone.b + bone.world_x;
                out[w + 1] = vx * bone.c + vy * bone.d + bone.world_y;
            }
        }
        MeshVertices::Weighted(v) => {
            let n = vertex_count.min(v.len().saturating_sub(start_vertex));
            // Deform offsets are stored per weight, so skip those of the leading vertices.
            let mut f = v.iter().take(start_vertex).map(Vec::len).sum::<usize>() * 2;
            for i in 0..n {
                let mut wx = 0.0f32;
                let mut wy = 0.0f32;
                for weight in &v[start_vertex + i] {
                    let dx = deform.get(f).copied().unwrap_or(0.0);
                    let dy = deform.get(f + 1).copied().unwrap_or(0.0);
                    f += 2;
                    let Some(b) = bones.get(weight.bone) else {
                        continue;
                    };
                    let vx = weight.x + dx;
                    let vy = weight.y + dy;
                    wx += (b.a * vx + b.b * vy + b.world_x) * weight.weight;
                    wy += (b.c * vx + b.d * vy + b.world_y) * weight.weight;
                }
                let w = offset + i * 2;
                out[w] = wx;
                out[w + 1] = wy;
            }
        }
    }
}
