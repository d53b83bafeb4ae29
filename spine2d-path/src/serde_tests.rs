use crate::{
    AttachmentData, BoneData, MeshVertices, PathAttachmentData, PathConstraintData, PositionMode,
    RotateMode, Skeleton, SkeletonData, SpacingMode,
};
use std::sync::Arc;

#[test]
fn constraint_definition_uses_camel_case_modes() {
    let mut constraint = PathConstraintData::new("pc", ["a", "b"], "pathSlot");
    constraint.rotate_mode = RotateMode::ChainScale;
    constraint.spacing_mode = SpacingMode::Percent;

    let json = serde_json::to_value(&constraint).unwrap();
    assert_eq!(json["rotateMode"], "chainScale");
    assert_eq!(json["spacingMode"], "percent");
    assert_eq!(json["positionMode"], "percent");
    assert_eq!(json["mixRotate"], 1.0);

    let back: PathConstraintData = serde_json::from_value(json).unwrap();
    assert_eq!(back.bones, ["a", "b"]);
    assert_eq!(back.rotate_mode, RotateMode::ChainScale);
}

#[test]
fn constraint_definition_fills_missing_fields_with_defaults() {
    let constraint: PathConstraintData = serde_json::from_str(
        r#"{ "name": "pc", "bones": ["b"], "target": "pathSlot", "positionMode": "fixed" }"#,
    )
    .unwrap();
    assert_eq!(constraint.position_mode, PositionMode::Fixed);
    assert_eq!(constraint.spacing_mode, SpacingMode::Length);
    assert_eq!(constraint.rotate_mode, RotateMode::Tangent);
    assert_eq!(constraint.mix_translate, 1.0);
}

#[test]
fn skeleton_data_survives_a_json_round_trip() {
    let mut data = SkeletonData::new();
    data.add_bone(BoneData::new("root")).unwrap();
    data.add_bone(BoneData {
        parent: Some(0),
        rotation: 90.0,
        length: 1.0,
        ..BoneData::new("b")
    })
    .unwrap();
    let slot = data.add_slot("pathSlot", "root", Some("p")).unwrap();
    data.add_attachment(
        slot,
        AttachmentData::Path(PathAttachmentData {
            name: "p".to_string(),
            vertices: MeshVertices::Unweighted(vec![
                [0.0, 0.0],
                [0.0, 0.0],
                [10.0 / 3.0, 0.0],
                [20.0 / 3.0, 0.0],
                [10.0, 0.0],
                [10.0, 0.0],
            ]),
            lengths: vec![10.0],
            closed: false,
            constant_speed: true,
        }),
    )
    .unwrap();
    let mut constraint = PathConstraintData::new("pc", ["b"], "pathSlot");
    constraint.position_mode = PositionMode::Fixed;
    constraint.position = 5.0;
    data.add_path_constraint(constraint).unwrap();

    let json = serde_json::to_string(&data).unwrap();
    let data: SkeletonData = serde_json::from_str(&json).unwrap();
    assert!(matches!(
        data.attachment(0, "p"),
        Some(AttachmentData::Path(p)) if p.constant_speed && p.lengths == [10.0]
    ));

    let mut skeleton = Skeleton::new(Arc::new(data)).unwrap();
    skeleton.update_world_transform();
    let b = &skeleton.bones[1];
    assert!((b.world_x - 5.0).abs() <= 1.0e-3, "{}", b.world_x);
    assert!(b.world_rotation_x().abs() <= 1.0e-3);
}
