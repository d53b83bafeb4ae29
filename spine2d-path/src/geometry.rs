//! Cubic Bézier evaluation and arc-length estimation on flat `f32` vertex buffers.

use std::f32::consts::PI;

pub(crate) const EPSILON: f32 = 1.0e-5;

/// Step constants for forward differencing a cubic over `n` equal parameter steps:
/// `h = 1/n`, `3h`, `3h²` and `6h³`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Subdivision {
    steps: usize,
    step3: f32,
    step2x3: f32,
    step3x6: f32,
}

/// Four steps: per-curve length estimate.
pub(crate) const COARSE: Subdivision = Subdivision {
    steps: 4,
    step3: 0.75,
    step2x3: 0.1875,
    step3x6: 0.09375,
};

/// Ten steps: per-segment length table for the active curve.
pub(crate) const FINE: Subdivision = Subdivision {
    steps: 10,
    step3: 0.3,
    step2x3: 0.03,
    step3x6: 0.006,
};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct CubicCurve {
    pub(crate) x1: f32,
    pub(crate) y1: f32,
    pub(crate) cx1: f32,
    pub(crate) cy1: f32,
    pub(crate) cx2: f32,
    pub(crate) cy2: f32,
    pub(crate) x2: f32,
    pub(crate) y2: f32,
}

impl CubicCurve {
    /// Reads `x1, y1, cx1, cy1, cx2, cy2, x2, y2` starting at `offset`.
    pub(crate) fn from_slice(world: &[f32], offset: usize) -> Self {
        let at = |i: usize| world.get(offset + i).copied().unwrap_or(0.0);
        Self {
            x1: at(0),
            y1: at(1),
            cx1: at(2),
            cy1: at(3),
            cx2: at(4),
            cy2: at(5),
            x2: at(6),
            y2: at(7),
        }
    }

    /// Chord lengths of `sub.steps` equal parameter steps along the curve.
    pub(crate) fn chords(&self, sub: Subdivision) -> Chords {
        let tmpx = (self.x1 - self.cx1 * 2.0 + self.cx2) * sub.step2x3;
        let tmpy = (self.y1 - self.cy1 * 2.0 + self.cy2) * sub.step2x3;
        let dddfx = ((self.cx1 - self.cx2) * 3.0 - self.x1 + self.x2) * sub.step3x6;
        let dddfy = ((self.cy1 - self.cy2) * 3.0 - self.y1 + self.y2) * sub.step3x6;
        Chords {
            dfx: (self.cx1 - self.x1) * sub.step3 + tmpx + dddfx * 0.16666667,
            dfy: (self.cy1 - self.y1) * sub.step3 + tmpy + dddfy * 0.16666667,
            ddfx: tmpx * 2.0 + dddfx,
            ddfy: tmpy * 2.0 + dddfy,
            dddfx,
            dddfy,
            remaining: sub.steps,
        }
    }

    pub(crate) fn length(&self, sub: Subdivision) -> f32 {
        self.chords(sub).sum()
    }

    /// Writes `x, y` (and the tangent angle when `tangents` is set) at parameter `p` into
    /// `output[o..o + 3]`.
    pub(crate) fn write_position(&self, mut p: f32, output: &mut [f32], o: usize, tangents: bool) {
        if p < EPSILON || p.is_nan() {
            p = EPSILON;
        }
        let Self {
            x1,
            y1,
            cx1,
            cy1,
            cx2,
            cy2,
            x2,
            y2,
        } = *self;
        let tt = p * p;
        let ttt = tt * p;
        let u = 1.0 - p;
        let uu = u * u;
        let uuu = uu * u;
        let ut = u * p;
        let ut3 = ut * 3.0;
        let uut3 = u * ut3;
        let utt3 = ut3 * p;
        let x = x1 * uuu + cx1 * uut3 + cx2 * utt3 + x2 * ttt;
        let y = y1 * uuu + cy1 * uut3 + cy2 * utt3 + y2 * ttt;
        output[o] = x;
        output[o + 1] = y;
        if tangents {
            output[o + 2] = (y - (y1 * uu + cy1 * ut * 2.0 + cy2 * tt))
                .atan2(x - (x1 * uu + cx1 * ut * 2.0 + cx2 * tt));
        }
    }
}

/// Forward-difference walk over a cubic, yielding the chord length of each step.
#[derive(Clone, Debug)]
pub(crate) struct Chords {
    dfx: f32,
    dfy: f32,
    ddfx: f32,
    ddfy: f32,
    dddfx: f32,
    dddfy: f32,
    remaining: usize,
}

impl Iterator for Chords {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let chord = (self.dfx * self.dfx + self.dfy * self.dfy).sqrt();
        self.dfx += self.ddfx;
        self.dfy += self.ddfy;
        self.ddfx += self.dddfx;
        self.ddfy += self.dddfy;
        Some(chord)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Fills `curves` with the cumulative estimated length at the end of each curve in `world`
/// (a knot followed by `cx1, cy1, cx2, cy2, x2, y2` per curve) and returns the total.
pub(crate) fn curve_lengths(world: &[f32], curves: &mut [f32]) -> f32 {
    let mut path_length = 0.0f32;
    for (i, out) in curves.iter_mut().enumerate() {
        path_length += CubicCurve::from_slice(world, i * 6).length(COARSE);
        *out = path_length;
    }
    path_length
}

/// Fills `segments` with cumulative lengths of ten equal parameter steps along `curve` and
/// returns the total.
pub(crate) fn segment_lengths(curve: &CubicCurve, segments: &mut [f32; 10]) -> f32 {
    let mut curve_length = 0.0f32;
    for (out, chord) in segments.iter_mut().zip(curve.chords(FINE)) {
        curve_length += chord;
        *out = curve_length;
    }
    curve_length
}

/// Extends the path before its first knot along the tangent at `temp[i..i + 4]`.
pub(crate) fn add_before_position(p: f32, temp: &[f32], i: usize, output: &mut [f32], o: usize) {
    let x1 = temp.get(i).copied().unwrap_or(0.0);
    let y1 = temp.get(i + 1).copied().unwrap_or(0.0);
    let dx = temp.get(i + 2).copied().unwrap_or(x1) - x1;
    let dy = temp.get(i + 3).copied().unwrap_or(y1) - y1;
    let r = dy.atan2(dx);
    output[o] = x1 + p * r.cos();
    output[o + 1] = y1 + p * r.sin();
    output[o + 2] = r;
}

/// Extends the path past its last knot along the tangent at `temp[i..i + 4]`.
pub(crate) fn add_after_position(p: f32, temp: &[f32], i: usize, output: &mut [f32], o: usize) {
    let x1 = temp.get(i + 2).copied().unwrap_or(0.0);
    let y1 = temp.get(i + 3).copied().unwrap_or(0.0);
    let dx = x1 - temp.get(i).copied().unwrap_or(x1);
    let dy = y1 - temp.get(i + 1).copied().unwrap_or(y1);
    let r = dy.atan2(dx);
    output[o] = x1 + p * r.cos();
    output[o + 1] = y1 + p * r.sin();
    output[o + 2] = r;
}

/// Single-step wrap into `[-PI, PI]`. Only valid for inputs within one turn of that range.
pub(crate) fn wrap_pi(mut radians: f32) -> f32 {
    const PI2: f32 = 2.0 * PI;
    if radians > PI {
        radians -= PI2;
    } else if radians < -PI {
        radians += PI2;
    }
    radians
}
