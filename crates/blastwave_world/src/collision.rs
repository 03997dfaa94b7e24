//! # Segment Collision
//!
//! Walks the voxels crossed by a line segment using DDA (Digital
//! Differential Analyzer). Only whole-voxel collision shapes are modelled.
//!
//! Distances are measured in segment fractions: `t = 0` at the start and
//! `t = 1` at the end. A voxel whose boundary is only reached at `t = 1`
//! is not entered, so points lying on a block face see past it.

use blastwave_shared::{Vec3, VoxelPos};

/// First blocking voxel on a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    /// The voxel that was hit.
    pub voxel: VoxelPos,
    /// Face normal of the hit (zero if the segment starts inside it).
    pub normal: [i32; 3],
    /// Segment fraction at which the voxel was entered.
    pub t: f64,
}

/// Walks from `from` to `to` and returns the first voxel for which
/// `blocking` is true.
pub fn first_hit(from: Vec3, to: Vec3, mut blocking: impl FnMut(VoxelPos) -> bool) -> Option<SegmentHit> {
    if !(from.is_finite() && to.is_finite()) {
        return None;
    }
    let origin = from.to_array();
    let delta = (to - from).to_array();
    let start = VoxelPos::containing(from);
    let mut voxel = [start.x, start.y, start.z];

    let mut step = [0i32; 3];
    let mut t_delta = [f64::INFINITY; 3];
    let mut t_max = [f64::INFINITY; 3];
    for axis in 0..3 {
        let d = delta[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_delta[axis] = 1.0 / d;
            t_max[axis] = (f64::from(voxel[axis] + 1) - origin[axis]) / d;
        } else if d < 0.0 {
            step[axis] = -1;
            t_delta[axis] = -1.0 / d;
            t_max[axis] = (f64::from(voxel[axis]) - origin[axis]) / d;
        }
    }

    let mut t = 0.0;
    let mut normal = [0i32; 3];
    loop {
        let pos = VoxelPos::new(voxel[0], voxel[1], voxel[2]);
        if blocking(pos) {
            return Some(SegmentHit { voxel: pos, normal, t });
        }

        let axis = if t_max[0] < t_max[1] && t_max[0] < t_max[2] {
            0
        } else if t_max[1] < t_max[2] {
            1
        } else {
            2
        };
        if t_max[axis] >= 1.0 {
            return None;
        }
        t = t_max[axis];
        t_max[axis] += t_delta[axis];
        voxel[axis] += step[axis];
        normal = [0; 3];
        normal[axis] = -step[axis];
    }
}

/// True if any voxel on the segment is blocking.
#[inline]
pub fn segment_blocked(from: Vec3, to: Vec3, blocking: impl FnMut(VoxelPos) -> bool) -> bool {
    first_hit(from, to, blocking).is_some()
}
