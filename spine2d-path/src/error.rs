use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown parent bone '{parent}' for bone '{bone}'")]
    UnknownBoneParent { bone: String, parent: String },

    #[error("duplicate bone name '{bone}'")]
    DuplicateBone { bone: String },

    #[error("unknown bone '{bone}' referenced by slot '{slot}'")]
    UnknownSlotBone { slot: String, bone: String },

    #[error("duplicate slot name '{slot}'")]
    DuplicateSlot { slot: String },

    #[error("unknown slot index {slot} for attachment '{attachment}'")]
    UnknownAttachmentSlot { slot: usize, attachment: String },

    #[error("unknown attachment '{attachment}' for slot '{slot}'")]
    UnknownAttachment { slot: String, attachment: String },

    #[error("invalid path data for attachment '{attachment}': {message}")]
    InvalidPathData { attachment: String, message: String },

    #[error("unknown bone '{bone}' referenced by path constraint '{constraint}'")]
    UnknownBone { constraint: String, bone: String },

    #[error("unknown target slot '{slot}' referenced by path constraint '{constraint}'")]
    UnknownSlot { constraint: String, slot: String },

    #[error("duplicate path constraint name '{constraint}'")]
    DuplicateConstraint { constraint: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}
