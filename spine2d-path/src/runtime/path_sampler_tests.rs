use super::test_rigs::{assert_approx, assert_approx_eps, polyline_lengths, polyline_vertices};
use crate::{PathGeometry, PathSampler};

/// Path geometry already in world space.
struct StaticPath {
    vertices: Vec<f32>,
    lengths: Vec<f32>,
    closed: bool,
    constant_speed: bool,
}

impl StaticPath {
    fn polyline(knots: &[[f32; 2]], closed: bool, constant_speed: bool) -> Self {
        Self {
            vertices: polyline_vertices(knots, closed).into_iter().flatten().collect(),
            lengths: polyline_lengths(knots, closed),
            closed,
            constant_speed,
        }
    }
}

impl PathGeometry for StaticPath {
    fn closed(&self) -> bool {
        self.closed
    }

    fn constant_speed(&self) -> bool {
        self.constant_speed
    }

    fn world_vertices_length(&self) -> usize {
        self.vertices.len()
    }

    fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    fn compute_world_vertices(&self, start: usize, count: usize, out: &mut [f32], offset: usize) {
        out[offset..offset + count].copy_from_slice(&self.vertices[start..start + count]);
    }
}

const SQUARE: [[f32; 2]; 4] = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]];

fn sample(path: &StaticPath, spaces: &[f32], position: f32) -> Vec<f32> {
    let mut sampler = PathSampler::default();
    let mut spaces = spaces.to_vec();
    sampler
        .compute_world_positions(path, &mut spaces, true, false, false, position)
        .unwrap()
        .to_vec()
}

fn assert_point(positions: &[f32], index: usize, x: f32, y: f32) {
    assert_approx(positions[index * 3], x);
    assert_approx(positions[index * 3 + 1], y);
}

#[test]
fn output_holds_a_triple_per_space_plus_padding() {
    let path = StaticPath::polyline(&SQUARE, false, false);
    let positions = sample(&path, &[0.0, 10.0, 10.0, 10.0], 0.0);
    assert_eq!(positions.len(), 4 * 3 + 2);
    assert_eq!(&positions[12..], &[0.0, 0.0]);
}

#[test]
fn closed_path_wraps_position_by_path_length() {
    for constant_speed in [true, false] {
        let path = StaticPath::polyline(&SQUARE, true, constant_speed);
        let spaces = [0.0, 25.0, 100.0, 150.0];

        let base = sample(&path, &spaces, 10.0);
        let wrapped = sample(&path, &spaces, 410.0);
        let negative = sample(&path, &spaces, -390.0);

        assert_point(&base, 0, 10.0, 0.0);
        assert_point(&base, 1, 35.0, 0.0);
        assert_point(&base, 2, 100.0, 35.0);
        assert_point(&base, 3, 15.0, 100.0);
        for other in [&wrapped, &negative] {
            for i in 0..spaces.len() {
                assert_approx_eps(other[i * 3], base[i * 3], 0.05);
                assert_approx_eps(other[i * 3 + 1], base[i * 3 + 1], 0.05);
            }
        }
    }
}

#[test]
fn closed_path_walks_the_closing_curve() {
    let path = StaticPath::polyline(&SQUARE, true, false);
    let positions = sample(&path, &[350.0], 0.0);
    assert_point(&positions, 0, 0.0, 50.0);
    assert_approx(positions[2].to_degrees(), -90.0);
}

#[test]
fn open_path_extends_before_start_along_first_tangent() {
    let knots = [[10.0, 20.0], [40.0, 60.0], [100.0, 60.0]];
    for constant_speed in [true, false] {
        let path = StaticPath::polyline(&knots, false, constant_speed);
        let positions = sample(&path, &[0.0, 5.0], -15.0);

        // First curve runs along (3, 4) / 5.
        assert_point(&positions, 0, 10.0 - 9.0, 20.0 - 12.0);
        assert_point(&positions, 1, 10.0 - 6.0, 20.0 - 8.0);
        assert_approx(positions[2], 4.0f32.atan2(3.0));
    }
}

#[test]
fn open_path_extends_past_end_along_last_tangent() {
    let knots = [[10.0, 20.0], [40.0, 60.0], [100.0, 60.0]];
    for constant_speed in [true, false] {
        let path = StaticPath::polyline(&knots, false, constant_speed);
        // Path length is 50 + 60.
        let positions = sample(&path, &[0.0, 2.5, 12.5], 110.0);

        assert_point(&positions, 0, 100.0, 60.0);
        assert_point(&positions, 1, 102.5, 60.0);
        assert_point(&positions, 2, 115.0, 60.0);
        assert_approx(positions[5], 0.0);
        assert_approx(positions[8], 0.0);
    }
}

#[test]
fn percent_position_and_spacing_scale_by_path_length() {
    let knots = [[0.0, 0.0], [0.0, 80.0], [60.0, 80.0]];
    for constant_speed in [true, false] {
        let path = StaticPath::polyline(&knots, false, constant_speed);
        let mut sampler = PathSampler::default();
        let mut spaces = vec![0.0, 0.25];
        let positions = sampler
            .compute_world_positions(&path, &mut spaces, false, true, true, 0.5)
            .unwrap();

        // Length 140: start at 70, then 35 further.
        assert_point(positions, 0, 0.0, 70.0);
        assert_point(positions, 1, 25.0, 80.0);
        assert_approx(spaces[1], 35.0);
    }
}

#[test]
fn tangents_are_only_written_when_requested_or_spacing_collapses() {
    let path = StaticPath::polyline(&SQUARE, false, false);
    let mut sampler = PathSampler::default();
    let mut spaces = vec![0.0, 150.0, 0.0];
    let positions = sampler
        .compute_world_positions(&path, &mut spaces, false, false, false, 0.0)
        .unwrap();

    assert_eq!(positions[2], 0.0);
    assert_eq!(positions[5], 0.0);
    assert_approx(positions[8].to_degrees(), 90.0);
}

#[test]
fn reused_sampler_matches_a_fresh_one() {
    let square = StaticPath::polyline(&SQUARE, true, true);
    let line = StaticPath::polyline(&[[0.0, 0.0], [30.0, 0.0]], false, true);
    let spaces = [0.0, 20.0, 20.0];

    let mut sampler = PathSampler::default();
    let mut scratch = spaces.to_vec();
    sampler.compute_world_positions(&square, &mut scratch, true, false, false, 0.0);
    let mut scratch = spaces.to_vec();
    let reused = sampler
        .compute_world_positions(&line, &mut scratch, true, false, false, 5.0)
        .unwrap()
        .to_vec();

    assert_eq!(reused, sample(&line, &spaces, 5.0));
    assert_eq!(sampler.curve_lengths().len(), 1);
}

#[test]
fn degenerate_paths_produce_no_positions() {
    let mut sampler = PathSampler::default();

    let single_knot = StaticPath {
        vertices: vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0],
        lengths: vec![],
        closed: false,
        constant_speed: true,
    };
    let mut spaces = vec![0.0];
    assert!(
        sampler
            .compute_world_positions(&single_knot, &mut spaces, true, false, false, 0.0)
            .is_none()
    );

    let mut missing_lengths = StaticPath::polyline(&SQUARE, false, false);
    missing_lengths.lengths.clear();
    assert!(
        sampler
            .compute_world_positions(&missing_lengths, &mut spaces, true, false, false, 0.0)
            .is_none()
    );

    let path = StaticPath::polyline(&SQUARE, false, false);
    assert!(
        sampler
            .compute_world_positions(&path, &mut [], true, false, false, 0.0)
            .is_none()
    );
}

#[test]
fn zero_length_path_stays_finite_at_its_start() {
    let point = StaticPath {
        vertices: vec![5.0; 12],
        lengths: vec![0.0],
        closed: false,
        constant_speed: true,
    };
    let positions = sample(&point, &[0.0, 0.0], 0.0);
    assert_point(&positions, 0, 5.0, 5.0);
    assert_point(&positions, 1, 5.0, 5.0);
}
