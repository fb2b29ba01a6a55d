use bytemuck::{Pod, Zeroable};
use sha2::{Digest, Sha256};

/// A lattice vertex. Position only; shading is procedural on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// Errors from grid construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("grid must be at least 2x2, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("grid {width}x{height} does not fit in 32-bit indices")]
    TooLarge { width: u32, height: u32 },
}

/// Vertex and index buffers for a W×H grid, ready for static upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMesh {
    width: u32,
    height: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl GridMesh {
    /// Build the lattice and its serpentine strip.
    pub fn build(width: u32, height: u32) -> Result<Self, MeshError> {
        if width < 2 || height < 2 {
            return Err(MeshError::InvalidDimensions { width, height });
        }
        if !Self::fits_index_space(width, height) {
            return Err(MeshError::TooLarge { width, height });
        }

        let vertices = lattice(width, height);
        let indices = weave(width, height);

        tracing::debug!(
            width,
            height,
            vertices = vertices.len(),
            indices = indices.len(),
            "grid mesh built"
        );

        Ok(Self {
            width,
            height,
            vertices,
            indices,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Index count the strip must have for a `width`×`height` grid.
    pub const fn expected_index_count(width: u32, height: u32) -> u64 {
        let (w, h) = (width as u64, height as u64);
        w * h + w.saturating_sub(1) * h.saturating_sub(2)
    }

    /// Whether every vertex can be addressed by a `u32` index and the strip
    /// length fits the `u32` draw count. `u32::MAX` stays free so it can
    /// never collide with a strip restart value.
    pub const fn fits_index_space(width: u32, height: u32) -> bool {
        let vertex_count = width as u64 * height as u64;
        vertex_count < u32::MAX as u64
            && Self::expected_index_count(width, height) < u32::MAX as u64
    }

    /// Linear index of lattice point `(i, j)`.
    pub fn vertex_index(&self, i: u32, j: u32) -> u32 {
        i + j * self.width
    }

    /// SHA-256 over the dimensions, the vertex bytes and the index bytes.
    pub fn digest(&self) -> [u8; 32] {
        self.hasher().finalize().into()
    }

    /// [`GridMesh::digest`] as lowercase hex.
    pub fn digest_hex(&self) -> String {
        format!("{:x}", self.hasher().finalize())
    }

    fn hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(bytemuck::cast_slice::<Vertex, u8>(&self.vertices));
        hasher.update(bytemuck::cast_slice::<u32, u8>(&self.indices));
        hasher
    }
}

/// Row-major lattice centred on the origin: `(i - W/2, 0, j - H/2)`.
fn lattice(width: u32, height: u32) -> Vec<Vertex> {
    let half_w = (width / 2) as f32;
    let half_h = (height / 2) as f32;
    let mut vertices = Vec::with_capacity(width as usize * height as usize);
    for j in 0..height {
        for i in 0..width {
            vertices.push(Vertex {
                position: [i as f32 - half_w, 0.0, j as f32 - half_h],
            });
        }
    }
    vertices
}

/// Boustrophedon weave: even rows run left to right pairing each column
/// with the row above, odd rows run right to left pairing the row above
/// with the previous column. The turn between passes produces the
/// degenerate connectors, so no restart index is needed.
fn weave(width: u32, height: u32) -> Vec<u32> {
    let expected = GridMesh::expected_index_count(width, height) as usize;
    let mut indices = Vec::with_capacity(expected);

    for j in 0..height - 1 {
        if j % 2 == 0 {
            for i in 0..width {
                indices.push(i + j * width);
                indices.push(i + (j + 1) * width);
            }
        } else {
            for i in (1..width).rev() {
                indices.push(i + (j + 1) * width);
                indices.push(i - 1 + j * width);
            }
        }
    }

    // A backwards final pass never reaches column 0 of the top row. Closing
    // on that vertex draws the last missing triangle and brings the strip
    // up to the count law.
    if indices.len() < expected {
        indices.push((height - 1) * width);
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_dimensions() {
        assert_eq!(
            GridMesh::build(1, 5),
            Err(MeshError::InvalidDimensions {
                width: 1,
                height: 5
            })
        );
        assert_eq!(
            GridMesh::build(4, 0),
            Err(MeshError::InvalidDimensions {
                width: 4,
                height: 0
            })
        );
        assert!(GridMesh::build(2, 2).is_ok());
    }

    #[test]
    fn rejects_grids_beyond_index_space() {
        let err = GridMesh::build(70_000, 70_000).unwrap_err();
        assert!(matches!(err, MeshError::TooLarge { .. }));
    }

    #[test]
    fn rejects_strips_longer_than_draw_count() {
        // The vertices fit in u32 here; the ~2·W·H strip does not.
        assert!(60_000u64 * 60_000 < u64::from(u32::MAX));
        assert_eq!(
            GridMesh::build(60_000, 60_000),
            Err(MeshError::TooLarge {
                width: 60_000,
                height: 60_000
            })
        );
        assert!(GridMesh::build(65_535, 65_535).is_err());
    }

    #[test]
    fn index_space_boundary() {
        assert!(GridMesh::fits_index_space(46_341, 46_341));
        assert!(GridMesh::expected_index_count(46_341, 46_341) < u64::from(u32::MAX));
        assert!(!GridMesh::fits_index_space(46_342, 46_342));
        assert!(GridMesh::expected_index_count(46_342, 46_342) >= u64::from(u32::MAX));
        assert!(GridMesh::fits_index_space(1500, 1500));
    }

    #[test]
    fn three_by_three_scenario() {
        let mesh = GridMesh::build(3, 3).unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.index_count(), 11);
        assert_eq!(&mesh.indices()[..6], &[0, 3, 1, 4, 2, 5]);
        assert_eq!(mesh.indices(), &[0, 3, 1, 4, 2, 5, 8, 4, 7, 3, 6]);

        for v in mesh.vertices() {
            assert!((-1.0..=1.0).contains(&v.position[0]));
            assert_eq!(v.position[1], 0.0);
            assert!((-1.0..=1.0).contains(&v.position[2]));
        }
        assert_eq!(mesh.vertices()[4].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn counts_follow_the_law() {
        for (w, h) in [(2, 2), (2, 3), (3, 2), (4, 4), (5, 7), (8, 3), (16, 9)] {
            let mesh = GridMesh::build(w, h).unwrap();
            assert_eq!(mesh.vertex_count(), w * h, "{w}x{h}");
            assert_eq!(
                u64::from(mesh.index_count()),
                GridMesh::expected_index_count(w, h),
                "{w}x{h}"
            );
        }
    }

    #[test]
    fn lattice_positions_are_exact() {
        let (w, h) = (6, 5);
        let mesh = GridMesh::build(w, h).unwrap();
        for j in 0..h {
            for i in 0..w {
                let v = mesh.vertices()[mesh.vertex_index(i, j) as usize];
                let expected = [
                    i as f32 - (w / 2) as f32,
                    0.0,
                    j as f32 - (h / 2) as f32,
                ];
                assert_eq!(v.position, expected);
            }
        }
    }

    #[test]
    fn strip_stays_in_bounds_and_steps_one_row() {
        for (w, h) in [(2, 2), (3, 3), (4, 6), (7, 5), (10, 10)] {
            let mesh = GridMesh::build(w, h).unwrap();
            let count = w * h;
            assert!(mesh.indices().iter().all(|&i| i < count));
            for pair in mesh.indices().windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let row_a = a / w;
                let row_b = b / w;
                assert!(row_a.abs_diff(row_b) <= 1, "{w}x{h}: {a} -> {b}");
                assert!(a.abs_diff(b) <= w + 1, "{w}x{h}: {a} -> {b}");
            }
        }
    }

    #[test]
    fn odd_rows_run_backwards() {
        let mesh = GridMesh::build(4, 3).unwrap();
        // Second pass starts at the far right of row 2 and meets row 1.
        assert_eq!(&mesh.indices()[8..14], &[11, 6, 10, 5, 9, 4]);
    }

    #[test]
    fn build_is_deterministic() {
        let a = GridMesh::build(33, 17).unwrap();
        let b = GridMesh::build(33, 17).unwrap();
        assert_eq!(
            bytemuck::cast_slice::<Vertex, u8>(a.vertices()),
            bytemuck::cast_slice::<Vertex, u8>(b.vertices())
        );
        assert_eq!(a.indices(), b.indices());
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), GridMesh::build(17, 33).unwrap().digest());
    }

    #[test]
    fn digest_hex_matches_digest() {
        let mesh = GridMesh::build(8, 5).unwrap();
        let hex = mesh.digest_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        let digest = mesh.digest();
        assert!(hex.starts_with(&format!("{:02x}{:02x}", digest[0], digest[1])));
        assert!(hex.ends_with(&format!("{:02x}", digest[31])));
    }
}
