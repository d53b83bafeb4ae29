use crate::PathGeometry;
use crate::geometry::{
    CubicCurve, EPSILON, add_after_position, add_before_position, curve_lengths, segment_lengths,
};

/// Which world vertices are currently materialized in the sampler's window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Cached {
    None,
    Before,
    After,
    Curve(usize),
}

/// Resolves distances along a path into world positions and tangent angles.
///
/// All buffers are reused between calls and only ever grow.
#[derive(Clone, Debug, Default)]
pub struct PathSampler {
    positions: Vec<f32>,
    world: Vec<f32>,
    curves: Vec<f32>,
    segments: [f32; 10],
}

impl PathSampler {
    /// Output of the last successful [`Self::compute_world_positions`] call.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Cumulative curve lengths estimated by the last constant speed evaluation.
    #[cfg(test)]
    pub(crate) fn curve_lengths(&self) -> &[f32] {
        &self.curves
    }

    /// Walks `spaces` (deltas, accumulated onto `position`) along `path`.
    ///
    /// Writes one `x, y, angle` triple per space followed by two padding floats; the angle of a
    /// sample is only computed when `tangents` is set, the space is (near) zero, or the sample
    /// lies outside an open path. When `percent_spacing` is set, `spaces` is scaled in place by
    /// the path length.
    ///
    /// Returns `None` when the path holds no complete curve or lacks its length table.
    pub fn compute_world_positions<P: PathGeometry + ?Sized>(
        &mut self,
        path: &P,
        spaces: &mut [f32],
        tangents: bool,
        percent_position: bool,
        percent_spacing: bool,
        position: f32,
    ) -> Option<&[f32]> {
        let closed = path.closed();
        let vertices_length = path.world_vertices_length();
        let knots = vertices_length / 6;
        let curve_count = if closed {
            knots
        } else {
            knots.saturating_sub(1)
        };
        if curve_count == 0 || spaces.is_empty() {
            return None;
        }

        let output_len = spaces.len() * 3 + 2;
        self.positions.resize(output_len, 0.0);
        self.positions[output_len - 2..].fill(0.0);

        if path.constant_speed() {
            self.sample_estimated(
                path,
                spaces,
                curve_count,
                tangents,
                percent_position,
                percent_spacing,
                position,
            );
        } else {
            let path_length = *path.lengths().get(curve_count - 1)?;
            self.sample_with_lengths(
                path,
                spaces,
                curve_count,
                path_length,
                tangents,
                percent_position,
                percent_spacing,
                position,
            );
        }
        Some(self.positions.as_slice())
    }

    /// Uses the path's own cumulative length table, materializing one curve at a time.
    #[allow(clippy::too_many_arguments)]
    fn sample_with_lengths<P: PathGeometry + ?Sized>(
        &mut self,
        path: &P,
        spaces: &mut [f32],
        curve_count: usize,
        path_length: f32,
        tangents: bool,
        percent_position: bool,
        percent_spacing: bool,
        mut position: f32,
    ) {
        let closed = path.closed();
        let vertices_length = path.world_vertices_length();
        let lengths = &path.lengths()[..curve_count];
        let last_curve = curve_count - 1;

        if percent_position {
            position *= path_length;
        }
        if percent_spacing {
            for space in spaces.iter_mut() {
                *space *= path_length;
            }
        }

        self.world.resize(8, 0.0);
        let output = self.positions.as_mut_slice();
        let world = self.world.as_mut_slice();
        let mut cached = Cached::None;
        let mut curve = 0usize;
        for (i, &space) in spaces.iter().enumerate() {
            let o = i * 3;
            position += space;
            let mut p = position;

            if closed {
                p = p.rem_euclid(path_length);
                curve = 0;
            } else if p < 0.0 {
                if cached != Cached::Before {
                    cached = Cached::Before;
                    path.compute_world_vertices(2, 4, world, 0);
                }
                add_before_position(p, world, 0, output, o);
                continue;
            } else if p > path_length {
                if cached != Cached::After {
                    cached = Cached::After;
                    path.compute_world_vertices(vertices_length - 6, 4, world, 0);
                }
                add_after_position(p - path_length, world, 0, output, o);
                continue;
            }

            p = locate_curve(lengths, &mut curve, p);

            if cached != Cached::Curve(curve) {
                cached = Cached::Curve(curve);
                if closed && curve == last_curve {
                    path.compute_world_vertices(vertices_length - 4, 4, world, 0);
                    path.compute_world_vertices(0, 4, world, 4);
                } else {
                    path.compute_world_vertices(curve * 6 + 2, 8, world, 0);
                }
            }

            CubicCurve::from_slice(world, 0).write_position(
                p,
                output,
                o,
                tangents || (i > 0 && space < EPSILON),
            );
        }
    }

    /// Materializes every curve, estimates their lengths, then reparameterizes within the
    /// active curve by a finer ten step length table.
    #[allow(clippy::too_many_arguments)]
    fn sample_estimated<P: PathGeometry + ?Sized>(
        &mut self,
        path: &P,
        spaces: &mut [f32],
        curve_count: usize,
        tangents: bool,
        percent_position: bool,
        percent_spacing: bool,
        mut position: f32,
    ) {
        let closed = path.closed();
        let vertices_length = path.world_vertices_length();

        // Drop the leading control point; a closed path repeats its first knot at the end.
        let world_length = if closed {
            let world_length = vertices_length + 2;
            self.world.resize(world_length, 0.0);
            path.compute_world_vertices(2, vertices_length - 2, &mut self.world, 0);
            path.compute_world_vertices(0, 2, &mut self.world, vertices_length - 2);
            self.world[world_length - 2] = self.world[0];
            self.world[world_length - 1] = self.world[1];
            world_length
        } else {
            let world_length = vertices_length - 4;
            self.world.resize(world_length, 0.0);
            path.compute_world_vertices(2, world_length, &mut self.world, 0);
            world_length
        };

        self.curves.resize(curve_count, 0.0);
        let path_length = curve_lengths(&self.world, &mut self.curves);

        if percent_position {
            position *= path_length;
        }
        if percent_spacing {
            for space in spaces.iter_mut() {
                *space *= path_length;
            }
        }

        let output = self.positions.as_mut_slice();
        let world = self.world.as_slice();
        let curves = self.curves.as_slice();
        let segments = &mut self.segments;
        let mut cached = Cached::None;
        let mut active = CubicCurve::default();
        let mut curve_length = 0.0f32;
        let mut curve = 0usize;
        let mut segment = 0usize;
        for (i, &space) in spaces.iter().enumerate() {
            let o = i * 3;
            position += space;
            let mut p = position;

            if closed {
                p = p.rem_euclid(path_length);
                curve = 0;
            } else if p < 0.0 {
                add_before_position(p, world, 0, output, o);
                continue;
            } else if p > path_length {
                add_after_position(p - path_length, world, world_length - 4, output, o);
                continue;
            }

            p = locate_curve(curves, &mut curve, p);

            if cached != Cached::Curve(curve) {
                cached = Cached::Curve(curve);
                active = CubicCurve::from_slice(world, curve * 6);
                curve_length = segment_lengths(&active, segments);
                segment = 0;
            }

            p = locate_segment(segments, &mut segment, p * curve_length);
            active.write_position(
                p * 0.1,
                output,
                o,
                tangents || (i > 0 && space < EPSILON),
            );
        }
    }
}

/// Finds the entry of the cumulative `table` containing `p` and returns `p` normalized to
/// that entry's `[start, end]` range.
///
/// The search resumes from `cursor`, falling back to a scan from the start when `p` lies
/// before the cursor's entry.
fn locate_curve(table: &[f32], cursor: &mut usize, p: f32) -> f32 {
    rewind(table, cursor, p);
    let length = table[*cursor];
    if *cursor == 0 {
        p / length
    } else {
        let prev = table[*cursor - 1];
        (p - prev) / (length - prev)
    }
}

/// Like [`locate_curve`] for the ten step table, returning the segment index plus the
/// fraction within it (so `0..=10`).
fn locate_segment(table: &[f32; 10], cursor: &mut usize, p: f32) -> f32 {
    rewind(table, cursor, p);
    let length = table[*cursor];
    if *cursor == 0 {
        p / length
    } else {
        let prev = table[*cursor - 1];
        *cursor as f32 + (p - prev) / (length - prev)
    }
}

fn rewind(table: &[f32], cursor: &mut usize, p: f32) {
    if *cursor >= table.len() || (*cursor > 0 && p < table[*cursor - 1]) {
        *cursor = 0;
    }
    while *cursor + 1 < table.len() && p > table[*cursor] {
        *cursor += 1;
    }
}
