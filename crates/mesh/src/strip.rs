use crate::grid::GridMesh;

/// Iterator over the triangles a strip index buffer rasterises to.
///
/// Every other triangle has its first two corners swapped so all
/// triangles share the winding of the first, matching how the GPU
/// assembles strips.
pub struct StripTriangles<'a> {
    indices: &'a [u32],
    next: usize,
}

impl<'a> StripTriangles<'a> {
    pub fn new(indices: &'a [u32]) -> Self {
        Self { indices, next: 0 }
    }
}

impl Iterator for StripTriangles<'_> {
    type Item = [u32; 3];

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next;
        if k + 2 >= self.indices.len() {
            return None;
        }
        self.next += 1;
        let (a, b, c) = (self.indices[k], self.indices[k + 1], self.indices[k + 2]);
        Some(if k % 2 == 0 { [a, b, c] } else { [b, a, c] })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.indices.len().saturating_sub(self.next + 2);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StripTriangles<'_> {}

/// Summary of a strip: how many triangles it draws and how many of them
/// are zero-area connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripStats {
    pub triangles: usize,
    pub degenerate: usize,
}

impl StripStats {
    pub fn visible(&self) -> usize {
        self.triangles - self.degenerate
    }
}

impl GridMesh {
    pub fn triangles(&self) -> StripTriangles<'_> {
        StripTriangles::new(self.indices())
    }

    /// Count triangles, treating any triangle with a repeated corner or
    /// three collinear lattice points as degenerate.
    pub fn strip_stats(&self) -> StripStats {
        let width = self.width();
        let mut stats = StripStats {
            triangles: 0,
            degenerate: 0,
        };
        for [a, b, c] in self.triangles() {
            stats.triangles += 1;
            if a == b || b == c || a == c || collinear(width, a, b, c) {
                stats.degenerate += 1;
            }
        }
        stats
    }
}

fn collinear(width: u32, a: u32, b: u32, c: u32) -> bool {
    let point = |i: u32| ((i % width) as i64, (i / width) as i64);
    let (ax, ay) = point(a);
    let (bx, by) = point(b);
    let (cx, cy) = point(c);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax) == 0
}
