//! Path constraint solver for Spine-style 2D skeletal rigs (unofficial).
//!
//! A path constraint moves and rotates an ordered chain of bones so that it follows a spline of
//! cubic Bézier curves shown by a slot's path attachment. The crate carries the minimal rig
//! ([`Skeleton`]) the constraint runs against; rendering, asset loading and animation
//! evaluation are left to the host.

#![forbid(unsafe_code)]

mod error;
mod geometry;
mod model;
mod runtime;

pub use error::*;
pub use model::*;
pub use runtime::*;


#[cfg(all(test, feature = "serde"))]
mod serde_tests;
