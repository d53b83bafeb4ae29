use crate::geometry::{EPSILON, wrap_pi};
use crate::{
    AttachmentData, Bone, BoundPath, Error, PathConstraintData, PathSampler, PositionMode,
    RotateMode, SkeletonData, Slot, SpacingMode,
};

/// Live state of a path constraint, bound to the bones and slot of one [`crate::Skeleton`].
///
/// `position`, `spacing` and the mixes start at the definition's values and may be overridden
/// per instance (e.g. by animation) between updates.
#[derive(Clone, Debug)]
pub struct PathConstraint {
    data_index: usize,
    bones: Vec<usize>,
    target: usize,
    order: i32,
    pub position: f32,
    pub spacing: f32,
    pub mix_rotate: f32,
    pub mix_translate: f32,

    spaces: Vec<f32>,
    lengths: Vec<f32>,
    sampler: PathSampler,
}

impl PathConstraint {
    /// Binds definition `data_index` of `data` by resolving its bone and slot names.
    pub fn new(data: &SkeletonData, data_index: usize) -> Result<Self, Error> {
        let Some(c) = data.path_constraints.get(data_index) else {
            return Err(Error::InvalidValue {
                message: format!("path constraint index {data_index} out of range"),
            });
        };

        let bones = c
            .bones
            .iter()
            .map(|name| {
                data.find_bone(name).ok_or_else(|| Error::UnknownBone {
                    constraint: c.name.clone(),
                    bone: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let target = data.find_slot(&c.target).ok_or_else(|| Error::UnknownSlot {
            constraint: c.name.clone(),
            slot: c.target.clone(),
        })?;

        log::debug!(
            "path constraint '{}' bound to {} bone(s), target slot '{}'",
            c.name,
            bones.len(),
            c.target
        );

        Ok(Self {
            data_index,
            bones,
            target,
            order: c.order,
            position: c.position,
            spacing: c.spacing,
            mix_rotate: c.mix_rotate,
            mix_translate: c.mix_translate,
            spaces: Vec::new(),
            lengths: Vec::new(),
            sampler: PathSampler::default(),
        })
    }

    pub fn data_index(&self) -> usize {
        self.data_index
    }

    /// Constrained bone indices, in chain order.
    pub fn bones(&self) -> &[usize] {
        &self.bones
    }

    /// Target slot index.
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_to_setup_pose(&mut self, data: &PathConstraintData) {
        self.position = data.position;
        self.spacing = data.spacing;
        self.mix_rotate = data.mix_rotate;
        self.mix_translate = data.mix_translate;
    }

    /// Spacing deltas used by the last update, after percent scaling.
    pub fn spaces(&self) -> &[f32] {
        &self.spaces
    }

    /// Sampled `x, y, angle` triples of the last update.
    pub fn positions(&self) -> &[f32] {
        self.sampler.positions()
    }

    /// Moves and rotates the constrained bones onto the target slot's path.
    ///
    /// Returns `false` without touching the pose when the slot shows no path attachment, both
    /// mixes are zero, or the path is degenerate.
    pub fn update(&mut self, data: &SkeletonData, bones: &mut [Bone], slots: &[Slot]) -> bool {
        let Some(c) = data.path_constraints.get(self.data_index) else {
            return false;
        };
        let Some(slot) = slots.get(self.target) else {
            return false;
        };
        let Some(path) = slot
            .attachment
            .as_deref()
            .and_then(|name| data.attachment(self.target, name))
            .and_then(AttachmentData::as_path)
        else {
            log::trace!(
                "path constraint '{}' skipped: slot '{}' shows no path attachment",
                c.name,
                c.target
            );
            return false;
        };

        let mix_rotate = self.mix_rotate;
        let mix_translate = self.mix_translate;
        let rotate = mix_rotate > 0.0;
        if mix_translate <= 0.0 && !rotate {
            return false;
        }
        if self.bones.is_empty() {
            return false;
        }

        let tangents = c.rotate_mode == RotateMode::Tangent;
        let scale = c.rotate_mode == RotateMode::ChainScale;
        let bone_count = self.bones.len();
        let spaces_count = if tangents { bone_count } else { bone_count + 1 };
        self.compute_spaces(data, bones, c.spacing_mode, scale, spaces_count);

        let geometry = BoundPath {
            path,
            slot,
            bones: &*bones,
        };
        let Some(positions) = self.sampler.compute_world_positions(
            &geometry,
            &mut self.spaces,
            tangents,
            c.position_mode == PositionMode::Percent,
            c.spacing_mode == SpacingMode::Percent,
            self.position,
        ) else {
            return false;
        };

        let mut offset_rotation = c.offset_rotation;
        let tip = if offset_rotation == 0.0 {
            c.rotate_mode == RotateMode::Chain
        } else {
            // Mirrored slot bones flip the offset direction.
            let reflect = bones
                .get(slot.bone)
                .is_some_and(|p| p.a * p.d - p.b * p.c <= 0.0);
            offset_rotation = offset_rotation.to_radians();
            if reflect {
                offset_rotation = -offset_rotation;
            }
            false
        };

        let spaces = self.spaces.as_slice();
        let lengths = self.lengths.as_slice();
        let mut bone_x = positions[0];
        let mut bone_y = positions[1];
        let mut applied = false;
        for (i, &bone_index) in self.bones.iter().enumerate() {
            let p = 3 + i * 3;
            let Some(bone) = bones.get_mut(bone_index) else {
                continue;
            };

            bone.world_x += (bone_x - bone.world_x) * mix_translate;
            bone.world_y += (bone_y - bone.world_y) * mix_translate;
            let x = positions[p];
            let y = positions[p + 1];
            let dx = x - bone_x;
            let dy = y - bone_y;

            if scale {
                let length = lengths.get(i).copied().unwrap_or(0.0);
                if length >= EPSILON {
                    let s = ((dx * dx + dy * dy).sqrt() / length - 1.0) * mix_rotate + 1.0;
                    bone.a *= s;
                    bone.c *= s;
                }
            }

            bone_x = x;
            bone_y = y;

            if rotate {
                let (a, b, c0, d) = (bone.a, bone.b, bone.c, bone.d);
                let mut r = if tangents {
                    positions[p - 1]
                } else if spaces[i + 1] < EPSILON {
                    positions[p + 2]
                } else {
                    dy.atan2(dx)
                };
                r -= c0.atan2(a);

                if tip {
                    // Keep the last bone's tip on the path rather than only aiming it.
                    let cos = r.cos();
                    let sin = r.sin();
                    let length = data
                        .bones
                        .get(bone.data_index())
                        .map_or(0.0, |bd| bd.length);
                    bone_x += (length * (cos * a - sin * c0) - dx) * mix_rotate;
                    bone_y += (length * (sin * a + cos * c0) - dy) * mix_rotate;
                } else {
                    r += offset_rotation;
                }

                r = wrap_pi(r) * mix_rotate;
                let cos = r.cos();
                let sin = r.sin();
                bone.a = cos * a - sin * c0;
                bone.b = cos * b - sin * d;
                bone.c = sin * a + cos * c0;
                bone.d = sin * b + cos * d;
            }

            bone.mark_applied_stale();
            applied = true;
        }

        applied
    }

    /// Fills `spaces` (index 0 is always 0) and, for chain scale, per-bone world lengths.
    fn compute_spaces(
        &mut self,
        data: &SkeletonData,
        bones: &[Bone],
        spacing_mode: SpacingMode,
        scale: bool,
        spaces_count: usize,
    ) {
        let spacing = self.spacing;
        self.spaces.resize(spaces_count, 0.0);
        self.spaces[0] = 0.0;
        self.lengths.resize(if scale { self.bones.len() } else { 0 }, 0.0);

        let length_spacing = spacing_mode == SpacingMode::Length;
        if !scale && !length_spacing {
            self.spaces[1..].fill(spacing);
            return;
        }

        for i in 0..spaces_count - 1 {
            let bone = self.bones.get(i).and_then(|&index| bones.get(index));
            let setup_length = bone
                .and_then(|b| data.bones.get(b.data_index()))
                .map_or(0.0, |bd| bd.length);
            let length = match bone {
                Some(bone) if setup_length >= EPSILON => {
                    let x = setup_length * bone.a;
                    let y = setup_length * bone.c;
                    (x * x + y * y).sqrt()
                }
                _ => {
                    if scale {
                        self.lengths[i] = 0.0;
                    }
                    self.spaces[i + 1] = 0.0;
                    continue;
                }
            };
            if scale {
                self.lengths[i] = length;
            }
            let base = if length_spacing {
                setup_length + spacing
            } else {
                spacing
            };
            self.spaces[i + 1] = base * length / setup_length;
        }
    }
}
