use crate::{AttachmentData, Error, PathConstraint, SkeletonData};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,

    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub shear_x: f32,
    pub shear_y: f32,

    pub ax: f32,
    pub ay: f32,
    pub arotation: f32,
    pub ascale_x: f32,
    pub ascale_y: f32,
    pub ashear_x: f32,
    pub ashear_y: f32,

    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub world_x: f32,
    pub world_y: f32,

    applied_valid: bool,
}

impl Bone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    /// `false` once a constraint has written the world transform and the applied local values
    /// no longer describe it. See [`Skeleton::update_applied_transform`].
    pub fn is_applied_valid(&self) -> bool {
        self.applied_valid
    }

    pub(crate) fn mark_applied_stale(&mut self) {
        self.applied_valid = false;
    }

    /// World rotation of the bone's x axis, in degrees.
    pub fn world_rotation_x(&self) -> f32 {
        self.c.atan2(self.a).to_degrees()
    }

    /// Length of the bone's world x axis.
    pub fn world_scale_x(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }

    #[cfg(feature = "glam")]
    pub fn world_position(&self) -> glam::Vec2 {
        glam::Vec2::new(self.world_x, self.world_y)
    }

    #[cfg(feature = "glam")]
    pub fn world_affine(&self) -> glam::Affine2 {
        glam::Affine2::from_cols_array(&[
            self.a,
            self.c,
            self.b,
            self.d,
            self.world_x,
            self.world_y,
        ])
    }
}

#[derive(Clone, Debug)]
pub struct Slot {
    data_index: usize,
    pub bone: usize,
    pub attachment: Option<String>,
    /// Vertex overrides for the current attachment. Empty when not deformed.
    pub deform: Vec<f32>,
}

impl Slot {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

impl crate::PointAttachmentData {
    pub fn compute_world_position(&self, bone: &Bone) -> [f32; 2] {
        [
            bone.a * self.x + bone.b * self.y + bone.world_x,
            bone.c * self.x + bone.d * self.y + bone.world_y,
        ]
    }

    pub fn compute_world_rotation(&self, bone: &Bone) -> f32 {
        bone.world_rotation_x() + self.rotation
    }
}

/// A live rig: the mutable pose shared by every constraint of one skeleton instance.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    bone_children: Vec<Vec<usize>>,
    pub slots: Vec<Slot>,
    pub path_constraints: Vec<PathConstraint>,
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    update_cache: Vec<UpdateCacheItem>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum UpdateCacheItem {
    Bone(usize),
    Path(usize),
}

impl Skeleton {
    /// Instantiates `data` in its setup pose. Fails when a path constraint names a bone or slot
    /// that does not exist.
    pub fn new(data: Arc<SkeletonData>) -> Result<Self, Error> {
        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(data_index, bone)| Bone {
                data_index,
                parent: bone.parent,
                x: bone.x,
                y: bone.y,
                rotation: bone.rotation,
                scale_x: bone.scale_x,
                scale_y: bone.scale_y,
                shear_x: bone.shear_x,
                shear_y: bone.shear_y,
                ax: bone.x,
                ay: bone.y,
                arotation: bone.rotation,
                ascale_x: bone.scale_x,
                ascale_y: bone.scale_y,
                ashear_x: bone.shear_x,
                ashear_y: bone.shear_y,
                a: 1.0,
                b: 0.0,
                c: 0.0,
                d: 1.0,
                world_x: 0.0,
                world_y: 0.0,
                applied_valid: true,
            })
            .collect::<Vec<_>>();

        let slots = data
            .slots
            .iter()
            .enumerate()
            .map(|(data_index, slot)| Slot {
                data_index,
                bone: slot.bone,
                attachment: slot.attachment.clone(),
                deform: Vec::new(),
            })
            .collect::<Vec<_>>();

        let mut path_constraints = Vec::with_capacity(data.path_constraints.len());
        for (index, c) in data.path_constraints.iter().enumerate() {
            if c.bones.is_empty() {
                log::warn!("path constraint '{}' constrains no bones", c.name);
            }
            path_constraints.push(PathConstraint::new(&data, index)?);
        }

        let bone_children = build_bone_children_indices(&bones);
        let mut skeleton = Self {
            data,
            bones,
            bone_children,
            slots,
            path_constraints,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            update_cache: Vec::new(),
        };
        skeleton.update_cache();
        Ok(skeleton)
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.data.find_bone(name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.data.find_slot(name)
    }

    pub fn find_path_constraint(&self, name: &str) -> Option<usize> {
        self.data.find_path_constraint(name)
    }

    /// Rebuilds the per-update order: every bone parent-first, then path constraints by
    /// definition order, each followed by the unconstrained descendants of its bones.
    pub fn update_cache(&mut self) {
        let bone_count = self.bones.len();
        let mut cache: Vec<UpdateCacheItem> = (0..bone_count).map(UpdateCacheItem::Bone).collect();

        let mut order: Vec<usize> = (0..self.path_constraints.len()).collect();
        order.sort_by_key(|&i| self.path_constraints[i].order());

        let mut constrained = vec![false; bone_count];
        let mut descendants = vec![false; bone_count];
        let mut stack = Vec::new();
        for index in order {
            cache.push(UpdateCacheItem::Path(index));
            let bones = self.path_constraints[index].bones();
            for &bone in bones {
                if let Some(flag) = constrained.get_mut(bone) {
                    *flag = true;
                }
            }

            descendants.fill(false);
            stack.clear();
            stack.extend(bones.iter().copied());
            while let Some(bone) = stack.pop() {
                for &child in self.bone_children.get(bone).into_iter().flatten() {
                    if !descendants[child] {
                        descendants[child] = true;
                        stack.push(child);
                    }
                }
            }
            // Bone indices are parent-first, so ascending order keeps parents ahead of children.
            cache.extend(
                (0..bone_count)
                    .filter(|&b| descendants[b] && !constrained[b])
                    .map(UpdateCacheItem::Bone),
            );
        }

        log::debug!(
            "update cache rebuilt: {} bone(s), {} path constraint(s), {} item(s)",
            bone_count,
            self.path_constraints.len(),
            cache.len()
        );
        self.update_cache = cache;
    }

    pub fn set_to_setup_pose(&mut self) {
        self.set_bones_to_setup_pose();
        self.set_slots_to_setup_pose();
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        for bone in &mut self.bones {
            let Some(data) = self.data.bones.get(bone.data_index) else {
                continue;
            };
            bone.x = data.x;
            bone.y = data.y;
            bone.rotation = data.rotation;
            bone.scale_x = data.scale_x;
            bone.scale_y = data.scale_y;
            bone.shear_x = data.shear_x;
            bone.shear_y = data.shear_y;
        }

        for constraint in &mut self.path_constraints {
            if let Some(data) = self.data.path_constraints.get(constraint.data_index()) {
                constraint.set_to_setup_pose(data);
            }
        }
    }

    pub fn set_slots_to_setup_pose(&mut self) {
        for slot in &mut self.slots {
            let Some(data) = self.data.slots.get(slot.data_index) else {
                continue;
            };
            slot.bone = data.bone;
            slot.attachment = data.attachment.clone();
            slot.deform.clear();
        }
    }

    /// Shows attachment `name` on `slot`, or hides the slot's attachment for `None`.
    pub fn set_attachment(&mut self, slot_index: usize, name: Option<&str>) -> Result<(), Error> {
        let Some(slot_data) = self.data.slots.get(slot_index) else {
            return Err(Error::InvalidValue {
                message: format!("slot index {slot_index} out of range"),
            });
        };
        if let Some(name) = name {
            if self.data.attachment(slot_index, name).is_none() {
                return Err(Error::UnknownAttachment {
                    slot: slot_data.name.clone(),
                    attachment: name.to_string(),
                });
            }
        }

        let slot = &mut self.slots[slot_index];
        if slot.attachment.as_deref() != name {
            slot.attachment = name.map(str::to_string);
            slot.deform.clear();
        }
        Ok(())
    }

    pub fn slot_attachment(&self, slot_index: usize) -> Option<&AttachmentData> {
        let name = self.slots.get(slot_index)?.attachment.as_deref()?;
        self.data.attachment(slot_index, name)
    }

    /// Runs one update pass: world transforms from local values, then path constraints in order.
    pub fn update_world_transform(&mut self) {
        self.reset_applied_transforms();

        let cache = std::mem::take(&mut self.update_cache);
        for item in cache.iter().copied() {
            match item {
                UpdateCacheItem::Bone(bone_index) => self.update_bone_world_transform(bone_index),
                UpdateCacheItem::Path(index) => {
                    self.apply_path_constraint(index);
                }
            }
        }
        self.update_cache = cache;
    }

    fn apply_path_constraint(&mut self, constraint_index: usize) -> bool {
        let Some(constraint) = self.path_constraints.get_mut(constraint_index) else {
            return false;
        };
        constraint.update(&self.data, &mut self.bones, &self.slots)
    }

    fn reset_applied_transforms(&mut self) {
        for bone in &mut self.bones {
            bone.ax = bone.x;
            bone.ay = bone.y;
            bone.arotation = bone.rotation;
            bone.ascale_x = bone.scale_x;
            bone.ascale_y = bone.scale_y;
            bone.ashear_x = bone.shear_x;
            bone.ashear_y = bone.shear_y;
            bone.applied_valid = true;
        }
    }

    fn update_bone_world_transform(&mut self, bone_index: usize) {
        let Some(parent_index) = self.bones.get(bone_index).map(|b| b.parent) else {
            return;
        };

        if let Some(parent_index) = parent_index {
            let Some(parent) = self.bones.get(parent_index).map(ParentTransform::from) else {
                return;
            };
            update_world_transform_child(&mut self.bones[bone_index], &parent);
        } else {
            let (x, y, scale_x, scale_y) = (self.x, self.y, self.scale_x, self.scale_y);
            update_world_transform_root(&mut self.bones[bone_index], x, y, scale_x, scale_y);
        }
    }

    /// Refreshes the applied local values of every bone whose world transform was written by a
    /// constraint.
    pub fn update_applied_transforms(&mut self) {
        for index in 0..self.bones.len() {
            if !self.bones[index].applied_valid {
                self.update_applied_transform(index);
            }
        }
    }

    /// Derives the bone's applied local values (`ax`, `ay`, `arotation`, ...) back from its world
    /// transform and its parent's.
    pub fn update_applied_transform(&mut self, bone_index: usize) {
        let Some(bone) = self.bones.get(bone_index) else {
            return;
        };
        let (a, b, c0, d, wx, wy) = (bone.a, bone.b, bone.c, bone.d, bone.world_x, bone.world_y);

        // Root bones are placed by the skeleton's own position and scale.
        let parent = match bone.parent {
            Some(p) => match self.bones.get(p) {
                Some(parent) => ParentTransform::from(parent),
                None => return,
            },
            None => ParentTransform {
                a: self.scale_x,
                b: 0.0,
                c: 0.0,
                d: self.scale_y,
                world_x: self.x,
                world_y: self.y,
            },
        };

        let pid = 1.0 / (parent.a * parent.d - parent.b * parent.c);
        let ia = parent.d * pid;
        let ib = parent.b * pid;
        let ic = parent.c * pid;
        let id = parent.a * pid;

        let dx = wx - parent.world_x;
        let dy = wy - parent.world_y;
        let ax = dx * ia - dy * ib;
        let ay = dy * id - dx * ic;

        let ra = ia * a - ib * c0;
        let rb = ia * b - ib * d;
        let rc = id * c0 - ic * a;
        let rd = id * d - ic * b;

        let mut ascale_x = (ra * ra + rc * rc).sqrt();
        let (arotation, ascale_y, ashear_y) = if ascale_x > 1.0e-4 {
            let det = ra * rd - rb * rc;
            let flip = if det < 0.0 { -1.0 } else { 1.0 };
            let ascale_y = (rb * rb + rd * rd).sqrt() * flip;
            let ashear_y = -((ra * rb + rc * rd) * flip).atan2(det * flip).to_degrees();
            (rc.atan2(ra).to_degrees(), ascale_y, ashear_y)
        } else {
            ascale_x = 0.0;
            let ascale_y = (rb * rb + rd * rd).sqrt();
            (90.0 - rd.atan2(rb).to_degrees(), ascale_y, 0.0)
        };

        let bone = &mut self.bones[bone_index];
        bone.ax = ax;
        bone.ay = ay;
        bone.arotation = arotation;
        bone.ascale_x = ascale_x;
        bone.ascale_y = ascale_y;
        bone.ashear_x = 0.0;
        bone.ashear_y = ashear_y;
        bone.applied_valid = true;
    }
}

#[derive(Copy, Clone, Debug)]
struct ParentTransform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    world_x: f32,
    world_y: f32,
}

impl From<&Bone> for ParentTransform {
    fn from(p: &Bone) -> Self {
        Self {
            a: p.a,
            b: p.b,
            c: p.c,
            d: p.d,
            world_x: p.world_x,
            world_y: p.world_y,
        }
    }
}

fn local_transform(bone: &Bone) -> (f32, f32, f32, f32) {
    let rotation_x = (bone.arotation + bone.ashear_x).to_radians();
    let rotation_y = (bone.arotation + 90.0 + bone.ashear_y).to_radians();
    (
        rotation_x.cos() * bone.ascale_x,
        rotation_y.cos() * bone.ascale_y,
        rotation_x.sin() * bone.ascale_x,
        rotation_y.sin() * bone.ascale_y,
    )
}

fn update_world_transform_root(bone: &mut Bone, x: f32, y: f32, scale_x: f32, scale_y: f32) {
    let (la, lb, lc, ld) = local_transform(bone);
    bone.a = la * scale_x;
    bone.b = lb * scale_x;
    bone.c = lc * scale_y;
    bone.d = ld * scale_y;
    bone.world_x = bone.ax * scale_x + x;
    bone.world_y = bone.ay * scale_y + y;
}

fn update_world_transform_child(bone: &mut Bone, parent: &ParentTransform) {
    let (pa, pb, pc, pd) = (parent.a, parent.b, parent.c, parent.d);
    bone.world_x = pa * bone.ax + pb * bone.ay + parent.world_x;
    bone.world_y = pc * bone.ax + pd * bone.ay + parent.world_y;

    let (la, lb, lc, ld) = local_transform(bone);
    bone.a = pa * la + pb * lc;
    bone.b = pa * lb + pb * ld;
    bone.c = pc * la + pd * lc;
    bone.d = pc * lb + pd * ld;
}

fn build_bone_children_indices(bones: &[Bone]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::<usize>::new(); bones.len()];
    for (index, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            if parent < children.len() {
                children[parent].push(index);
            }
        }
    }
    children
}
