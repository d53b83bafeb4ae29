use serde_json::json;
use spine2d_path::{
    AttachmentData, BoneData, MeshVertices, PathAttachmentData, PathConstraintData, PositionMode,
    RotateMode, Skeleton, SkeletonData, SpacingMode,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Four bone chain on an open S-shaped path of two curves.
fn demo_skeleton_data() -> SkeletonData {
    let mut data = SkeletonData::new();
    data.add_bone(BoneData::new("root")).expect("root");
    for i in 0..4 {
        data.add_bone(BoneData {
            parent: Some(i),
            x: if i == 0 { 0.0 } else { 40.0 },
            length: 40.0,
            ..BoneData::new(format!("spine{i}"))
        })
        .expect("bone");
    }

    let slot = data
        .add_slot("path", "root", Some("s-curve"))
        .expect("slot");
    data.add_attachment(
        slot,
        AttachmentData::Path(PathAttachmentData {
            name: "s-curve".to_string(),
            vertices: MeshVertices::Unweighted(vec![
                [0.0, 0.0],
                [0.0, 0.0],
                [60.0, 80.0],
                [60.0, 80.0],
                [100.0, 0.0],
                [140.0, -80.0],
                [200.0, 0.0],
                [200.0, 0.0],
                [200.0, 0.0],
            ]),
            lengths: Vec::new(),
            closed: false,
            constant_speed: true,
        }),
    )
    .expect("attachment");

    let mut constraint = PathConstraintData::new(
        "follow",
        ["spine0", "spine1", "spine2", "spine3"],
        "path",
    );
    constraint.position_mode = PositionMode::Fixed;
    constraint.spacing_mode = SpacingMode::Length;
    constraint.rotate_mode = RotateMode::Chain;
    data.add_path_constraint(constraint).expect("constraint");
    data
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut position: Option<f32> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--position" => {
                position = args.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let data = match positional.first().map(PathBuf::from) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).expect("read json");
            serde_json::from_str::<SkeletonData>(&json).expect("parse json")
        }
        None => demo_skeleton_data(),
    };

    let mut skeleton = Skeleton::new(Arc::new(data)).expect("skeleton");
    skeleton.set_to_setup_pose();
    if let Some(position) = position {
        for constraint in &mut skeleton.path_constraints {
            constraint.position = position;
        }
    }
    skeleton.update_world_transform();
    skeleton.update_applied_transforms();

    let bones: Vec<_> = skeleton
        .bones
        .iter()
        .enumerate()
        .map(|(i, bone)| {
            let name = skeleton
                .data
                .bones
                .get(i)
                .map(|b| b.name.as_str())
                .unwrap_or("<unknown>");
            json!({
                "i": i,
                "name": name,
                "world": {"a": bone.a, "b": bone.b, "c": bone.c, "d": bone.d, "x": bone.world_x, "y": bone.world_y},
                "applied": {"x": bone.ax, "y": bone.ay, "rotation": bone.arotation, "scaleX": bone.ascale_x, "scaleY": bone.ascale_y, "shearX": bone.ashear_x, "shearY": bone.ashear_y},
            })
        })
        .collect();

    let path_constraints: Vec<_> = skeleton
        .path_constraints
        .iter()
        .map(|c| {
            let name = skeleton
                .data
                .path_constraints
                .get(c.data_index())
                .map(|d| d.name.as_str())
                .unwrap_or("<unknown>");
            json!({
                "i": c.data_index(),
                "name": name,
                "position": c.position,
                "spacing": c.spacing,
                "mixRotate": c.mix_rotate,
                "mixTranslate": c.mix_translate,
                "spaces": c.spaces(),
                "positions": c.positions(),
            })
        })
        .collect();

    let out = json!({
        "bones": bones,
        "pathConstraints": path_constraints,
    });

    println!("{}", serde_json::to_string(&out).expect("json"));
}
