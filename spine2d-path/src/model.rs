use crate::Error;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Setup pose of a single bone.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    /// Setup-time reference length. Bones shorter than `1e-5` are treated as points.
    pub length: f32,
    pub x: f32,
    pub y: f32,
    /// Degrees.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Degrees.
    pub shear_x: f32,
    /// Degrees.
    pub shear_y: f32,
}

impl BoneData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for BoneData {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            length: 0.0,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            shear_x: 0.0,
            shear_y: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotData {
    pub name: String,
    pub bone: usize,
    /// Attachment shown in the setup pose.
    pub attachment: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum PositionMode {
    Fixed,
    #[default]
    Percent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum SpacingMode {
    #[default]
    Length,
    Fixed,
    Percent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum RotateMode {
    #[default]
    Tangent,
    Chain,
    ChainScale,
}

/// Definition of a path constraint, shared by every rig instantiated from the same data.
///
/// Bones and the target slot are referenced by name and resolved when a [`crate::Skeleton`]
/// is created from the data.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct PathConstraintData {
    pub name: String,
    /// Position of the constraint in the rig's update order.
    pub order: i32,
    pub bones: Vec<String>,
    pub target: String,
    pub position_mode: PositionMode,
    pub spacing_mode: SpacingMode,
    pub rotate_mode: RotateMode,
    /// Degrees.
    pub offset_rotation: f32,
    pub position: f32,
    pub spacing: f32,
    pub mix_rotate: f32,
    pub mix_translate: f32,
}

impl PathConstraintData {
    pub fn new(
        name: impl Into<String>,
        bones: impl IntoIterator<Item = impl Into<String>>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bones: bones.into_iter().map(Into::into).collect(),
            target: target.into(),
            ..Self::default()
        }
    }
}

impl Default for PathConstraintData {
    fn default() -> Self {
        Self {
            name: String::new(),
            order: 0,
            bones: Vec::new(),
            target: String::new(),
            position_mode: PositionMode::default(),
            spacing_mode: SpacingMode::default(),
            rotate_mode: RotateMode::default(),
            offset_rotation: 0.0,
            position: 0.0,
            spacing: 0.0,
            mix_rotate: 1.0,
            mix_translate: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexWeight {
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum MeshVertices {
    /// Positions in the slot bone's space.
    Unweighted(Vec<[f32; 2]>),
    /// Per-vertex influences, positions in each influencing bone's space.
    Weighted(Vec<Vec<VertexWeight>>),
}

impl MeshVertices {
    /// Number of vertices (not floats).
    pub fn len(&self) -> usize {
        match self {
            MeshVertices::Unweighted(v) => v.len(),
            MeshVertices::Weighted(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "camelCase")
)]
pub enum AttachmentData {
    Point(PointAttachmentData),
    Path(PathAttachmentData),
    BoundingBox(BoundingBoxAttachmentData),
}

impl AttachmentData {
    pub fn name(&self) -> &str {
        match self {
            AttachmentData::Point(a) => a.name.as_str(),
            AttachmentData::Path(a) => a.name.as_str(),
            AttachmentData::BoundingBox(a) => a.name.as_str(),
        }
    }

    pub fn as_path(&self) -> Option<&PathAttachmentData> {
        match self {
            AttachmentData::Path(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointAttachmentData {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Degrees.
    pub rotation: f32,
}

/// Hit area polygon. A constraint whose target slot shows one does nothing.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBoxAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
}

/// A spline made of cubic Bézier curves.
///
/// Vertices come in triples per knot: incoming control point, knot, outgoing control point.
/// An open path with `n` knots has `n - 1` curves; a closed path has `n` curves, the last one
/// joining the final knot back to the first.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PathAttachmentData {
    pub name: String,
    pub vertices: MeshVertices,
    /// Cumulative setup-pose length at the end of each curve. Required unless
    /// `constant_speed` is set.
    pub lengths: Vec<f32>,
    pub closed: bool,
    pub constant_speed: bool,
}

impl PathAttachmentData {
    pub fn world_vertices_length(&self) -> usize {
        self.vertices.len() * 2
    }

    pub fn curve_count(&self) -> usize {
        let knots = self.vertices.len() / 3;
        if self.closed {
            knots
        } else {
            knots.saturating_sub(1)
        }
    }

    pub(crate) fn validate(&self, bone_count: usize) -> Result<(), Error> {
        let invalid = |message: String| Error::InvalidPathData {
            attachment: self.name.clone(),
            message,
        };

        let vertex_count = self.vertices.len();
        if vertex_count % 3 != 0 {
            return Err(invalid(format!(
                "vertex count {vertex_count} is not a multiple of 3"
            )));
        }
        if self.curve_count() == 0 {
            return Err(invalid(format!(
                "{vertex_count} vertices do not form a single curve"
            )));
        }
        if !self.constant_speed && self.lengths.len() < self.curve_count() {
            return Err(invalid(format!(
                "expected {} curve lengths, got {}",
                self.curve_count(),
                self.lengths.len()
            )));
        }
        if self.lengths.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("curve lengths must be non-decreasing".to_string()));
        }
        if let MeshVertices::Weighted(weights) = &self.vertices {
            if let Some(w) = weights.iter().flatten().find(|w| w.bone >= bone_count) {
                return Err(invalid(format!("weight references unknown bone {}", w.bone)));
            }
        }
        Ok(())
    }
}

/// Immutable rig definition: bones, slots, attachments and path constraints.
#[derive(Clone, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct SkeletonData {
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    /// Attachments available to each slot, keyed by attachment name.
    pub attachments: Vec<HashMap<String, AttachmentData>>,
    pub path_constraints: Vec<PathConstraintData>,
}

impl SkeletonData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bone. Parents must be added before their children.
    pub fn add_bone(&mut self, bone: BoneData) -> Result<usize, Error> {
        if self.find_bone(&bone.name).is_some() {
            return Err(Error::DuplicateBone { bone: bone.name });
        }
        if let Some(parent) = bone.parent {
            if parent >= self.bones.len() {
                return Err(Error::UnknownBoneParent {
                    bone: bone.name,
                    parent: parent.to_string(),
                });
            }
        }
        self.bones.push(bone);
        Ok(self.bones.len() - 1)
    }

    pub fn add_slot(
        &mut self,
        name: impl Into<String>,
        bone: &str,
        attachment: Option<&str>,
    ) -> Result<usize, Error> {
        let name = name.into();
        if self.find_slot(&name).is_some() {
            return Err(Error::DuplicateSlot { slot: name });
        }
        let Some(bone_index) = self.find_bone(bone) else {
            return Err(Error::UnknownSlotBone {
                slot: name,
                bone: bone.to_string(),
            });
        };
        self.slots.push(SlotData {
            name,
            bone: bone_index,
            attachment: attachment.map(str::to_string),
        });
        self.attachments.push(HashMap::new());
        Ok(self.slots.len() - 1)
    }

    /// Registers an attachment for a slot, replacing any attachment with the same name.
    pub fn add_attachment(&mut self, slot: usize, attachment: AttachmentData) -> Result<(), Error> {
        if let AttachmentData::Path(path) = &attachment {
            path.validate(self.bones.len())?;
        }
        let Some(map) = self.attachments.get_mut(slot) else {
            return Err(Error::UnknownAttachmentSlot {
                slot,
                attachment: attachment.name().to_string(),
            });
        };
        map.insert(attachment.name().to_string(), attachment);
        Ok(())
    }

    pub fn add_path_constraint(&mut self, constraint: PathConstraintData) -> Result<usize, Error> {
        if self.find_path_constraint(&constraint.name).is_some() {
            return Err(Error::DuplicateConstraint {
                constraint: constraint.name,
            });
        }
        for (field, value) in [
            ("position", constraint.position),
            ("spacing", constraint.spacing),
            ("mix_rotate", constraint.mix_rotate),
            ("mix_translate", constraint.mix_translate),
            ("offset_rotation", constraint.offset_rotation),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidValue {
                    message: format!(
                        "path constraint '{}': {field} must be finite, got {value}",
                        constraint.name
                    ),
                });
            }
        }
        self.path_constraints.push(constraint);
        Ok(self.path_constraints.len() - 1)
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn find_path_constraint(&self, name: &str) -> Option<usize> {
        self.path_constraints.iter().position(|c| c.name == name)
    }

    pub fn attachment(&self, slot: usize, name: &str) -> Option<&AttachmentData> {
        self.attachments.get(slot)?.get(name)
    }
}
