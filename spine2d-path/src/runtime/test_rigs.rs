use crate::{
    AttachmentData, Bone, BoneData, MeshVertices, PathAttachmentData, PathConstraintData,
    Skeleton, SkeletonData,
};
use std::sync::Arc;

pub(crate) fn assert_approx_eps(actual: f32, expected: f32, eps: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= eps,
        "expected {expected}, got {actual} (diff {diff}, eps {eps})"
    );
}

pub(crate) fn assert_approx(actual: f32, expected: f32) {
    assert_approx_eps(actual, expected, 1.0e-2);
}

pub(crate) fn world(bone: &Bone) -> [f32; 6] {
    [bone.a, bone.b, bone.c, bone.d, bone.world_x, bone.world_y]
}

/// Knot triples for `knots` (incoming control, knot, outgoing control), with controls at a
/// third of the way to the neighbouring knots so parameter and arc length agree.
pub(crate) fn polyline_vertices(knots: &[[f32; 2]], closed: bool) -> Vec<[f32; 2]> {
    let n = knots.len();
    let third = |from: [f32; 2], to: [f32; 2]| {
        [
            from[0] + (to[0] - from[0]) / 3.0,
            from[1] + (to[1] - from[1]) / 3.0,
        ]
    };
    let mut vertices = Vec::with_capacity(n * 3);
    for (i, &knot) in knots.iter().enumerate() {
        let prev = if i > 0 {
            Some(knots[i - 1])
        } else if closed {
            Some(knots[n - 1])
        } else {
            None
        };
        let next = if i + 1 < n {
            Some(knots[i + 1])
        } else if closed {
            Some(knots[0])
        } else {
            None
        };
        vertices.push(prev.map_or(knot, |p| third(knot, p)));
        vertices.push(knot);
        vertices.push(next.map_or(knot, |n| third(knot, n)));
    }
    vertices
}

/// Cumulative segment lengths of the polyline through `knots`.
pub(crate) fn polyline_lengths(knots: &[[f32; 2]], closed: bool) -> Vec<f32> {
    let mut lengths = Vec::with_capacity(knots.len());
    let mut total = 0.0f32;
    let count = if closed { knots.len() } else { knots.len() - 1 };
    for i in 0..count {
        let a = knots[i];
        let b = knots[(i + 1) % knots.len()];
        total += ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
        lengths.push(total);
    }
    lengths
}

pub(crate) fn polyline_path(
    name: &str,
    knots: &[[f32; 2]],
    closed: bool,
    constant_speed: bool,
) -> PathAttachmentData {
    PathAttachmentData {
        name: name.to_string(),
        vertices: MeshVertices::Unweighted(polyline_vertices(knots, closed)),
        lengths: polyline_lengths(knots, closed),
        closed,
        constant_speed,
    }
}

/// Open path along +x from `0` to `length`, split into `curves` straight curves.
pub(crate) fn straight_path(length: f32, curves: usize, constant_speed: bool) -> PathAttachmentData {
    let knots = (0..=curves)
        .map(|k| [length * k as f32 / curves as f32, 0.0])
        .collect::<Vec<_>>();
    polyline_path("path", &knots, false, constant_speed)
}

/// `root`, then `b0..bn` chained with the given lengths (`b0` rotated 90 degrees, each child
/// placed at its parent's tip), a `pathSlot` on `root` showing `path`, and one constraint `pc`
/// over the chain. `configure` tweaks the constraint before the skeleton is built.
pub(crate) fn chain_rig(
    bone_lengths: &[f32],
    path: PathAttachmentData,
    configure: impl FnOnce(&mut PathConstraintData),
) -> Skeleton {
    let mut data = SkeletonData::new();
    data.add_bone(BoneData::new("root")).unwrap();
    let mut names = Vec::new();
    for (i, &length) in bone_lengths.iter().enumerate() {
        let name = format!("b{i}");
        let bone = if i == 0 {
            BoneData {
                parent: Some(0),
                rotation: 90.0,
                length,
                ..BoneData::new(&name)
            }
        } else {
            BoneData {
                parent: Some(i),
                x: bone_lengths[i - 1],
                length,
                ..BoneData::new(&name)
            }
        };
        data.add_bone(bone).unwrap();
        names.push(name);
    }

    let path_name = path.name.clone();
    let slot = data
        .add_slot("pathSlot", "root", Some(path_name.as_str()))
        .unwrap();
    data.add_attachment(slot, AttachmentData::Path(path)).unwrap();

    let mut constraint = PathConstraintData::new("pc", names, "pathSlot");
    constraint.position_mode = crate::PositionMode::Fixed;
    constraint.spacing_mode = crate::SpacingMode::Fixed;
    configure(&mut constraint);
    data.add_path_constraint(constraint).unwrap();

    let mut skeleton = Skeleton::new(Arc::new(data)).unwrap();
    skeleton.set_to_setup_pose();
    skeleton
}

/// Runs only the constraint against the current world pose, skipping the bone pass.
pub(crate) fn reapply(skeleton: &mut Skeleton) -> bool {
    skeleton.path_constraints[0].update(&skeleton.data, &mut skeleton.bones, &skeleton.slots)
}
