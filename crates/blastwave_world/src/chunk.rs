//! # Chunk Storage
//!
//! Voxels are stored in 16x16 columns spanning the whole build height.
//! Chunks are created on first write; reads from missing chunks see air.
//!
//! ## Layout
//!
//! Each chunk holds `16 * 16 * height` voxels in one flat vector, indexed
//! as `[y][z][x]` so a horizontal slice is contiguous.

use blastwave_core::Voxel;
use blastwave_shared::VoxelPos;

/// Chunk width/depth in voxels.
pub const CHUNK_SIZE: usize = 16;

/// Chunk coordinate (identifies a column in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not voxels).
    pub x: i32,
    /// Z coordinate (in chunks, not voxels).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk holding `pos`.
    #[inline]
    #[must_use]
    pub const fn containing(pos: VoxelPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE as i32),
            z: pos.z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World X coordinate of the chunk's corner.
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE as i32
    }

    /// World Z coordinate of the chunk's corner.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE as i32
    }
}

/// One column of voxels.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    min_y: i32,
    height: usize,
    voxels: Vec<Voxel>,
    /// Whether any voxel changed since creation.
    pub modified: bool,
}

impl Chunk {
    /// Creates an all-air chunk covering `min_y .. min_y + height`.
    #[must_use]
    pub fn new(coord: ChunkCoord, min_y: i32, height: usize) -> Self {
        Self {
            coord,
            min_y,
            height,
            voxels: vec![Voxel::AIR; CHUNK_SIZE * CHUNK_SIZE * height],
            modified: false,
        }
    }

    fn index(&self, pos: VoxelPos) -> Option<usize> {
        let x = pos.x - self.coord.world_x();
        let z = pos.z - self.coord.world_z();
        let y = pos.y - self.min_y;
        let size = CHUNK_SIZE as i32;
        if !(0..size).contains(&x) || !(0..size).contains(&z) || y < 0 || y as usize >= self.height {
            return None;
        }
        Some((y as usize * CHUNK_SIZE + z as usize) * CHUNK_SIZE + x as usize)
    }

    /// Voxel at world position `pos`; air outside this chunk.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: VoxelPos) -> Voxel {
        self.index(pos).map_or(Voxel::AIR, |i| self.voxels[i])
    }

    /// Writes the voxel at world position `pos`. Returns false if `pos` is
    /// not inside this chunk.
    pub fn set(&mut self, pos: VoxelPos, voxel: Voxel) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.voxels[i] = voxel;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Number of voxels that are not plain air.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.voxels.iter().filter(|v| **v != Voxel::AIR).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastwave_core::BlockState;
    use blastwave_core::BlockId;

    #[test]
    fn test_chunk_coord_from_voxel() {
        assert_eq!(ChunkCoord::containing(VoxelPos::new(0, 5, 0)), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(VoxelPos::new(15, 0, 15)), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(VoxelPos::new(16, 0, 16)), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::containing(VoxelPos::new(-1, 0, -1)), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::containing(VoxelPos::new(-17, 0, -16)), ChunkCoord::new(-2, -1));
    }

    #[test]
    fn test_set_and_get() {
        let mut chunk = Chunk::new(ChunkCoord::new(-1, 0), -64, 384);
        let pos = VoxelPos::new(-3, -64, 7);
        let stone = Voxel::block(BlockState::of(BlockId(1)));
        assert!(chunk.set(pos, stone));
        assert_eq!(chunk.get(pos), stone);
        assert!(chunk.modified);
        assert_eq!(chunk.occupied(), 1);
    }

    #[test]
    fn test_out_of_chunk_is_air() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 0, 16);
        assert!(!chunk.set(VoxelPos::new(16, 0, 0), Voxel::AIR));
        assert!(!chunk.set(VoxelPos::new(0, 16, 0), Voxel::AIR));
        assert_eq!(chunk.get(VoxelPos::new(0, -1, 0)), Voxel::AIR);
    }
}
