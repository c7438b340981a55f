//! Tree addresses.
//!
//! An address is the ordered sequence of quadrant indices taken from the
//! root, one per depth level.  It identifies a node (and, at full depth, a
//! pixel) uniquely; the downstream engine consumes addresses in exactly
//! this form.

use serde::{Deserialize, Serialize};

use crate::quadrant::Quadrant;

/// Path from the root of a quadtree to one of its nodes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct Address {
    quadrants: Vec<Quadrant>,
}

impl Address {
    /// The root address (empty path).
    pub fn root() -> Self {
        Self { quadrants: Vec::new() }
    }

    pub fn from_vec(quadrants: Vec<Quadrant>) -> Self {
        Self { quadrants }
    }

    pub fn from_slice(quadrants: &[Quadrant]) -> Self {
        Self { quadrants: quadrants.to_vec() }
    }

    /// Address of the pixel `(x, y)` at `depth` levels below the root.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` does not fit in a `2^depth` grid.
    pub fn from_xy(x: u64, y: u64, depth: u32) -> Self {
        let dim = 1u64 << depth;
        assert!(x < dim && y < dim, "({x}, {y}) outside a {dim}x{dim} grid");

        let mut quadrants = Vec::with_capacity(depth as usize);
        for level in (0..depth).rev() {
            let mask = 1u64 << level;
            quadrants.push(Quadrant::from_sides(x & mask != 0, y & mask != 0));
        }
        Self { quadrants }
    }

    /// Pixel coordinates of this node's top-left corner, in the grid at the
    /// address's own depth.
    pub fn to_xy(&self) -> (u64, u64) {
        let mut x = 0;
        let mut y = 0;
        for quadrant in &self.quadrants {
            let (dx, dy) = quadrant.offsets();
            x = (x << 1) | dx;
            y = (y << 1) | dy;
        }
        (x, y)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.quadrants.len()
    }

    #[inline]
    pub fn at(&self, index: usize) -> Quadrant {
        self.quadrants[index]
    }

    #[inline]
    pub fn as_slice(&self) -> &[Quadrant] {
        &self.quadrants
    }

    /// The address one level deeper, into `quadrant`.
    pub fn child(&self, quadrant: Quadrant) -> Self {
        let mut quadrants = self.quadrants.clone();
        quadrants.push(quadrant);
        Self { quadrants }
    }

    /// Raw quadrant indices, for handing to the external engine.
    pub fn to_indices(&self) -> Vec<u8> {
        self.quadrants.iter().map(|q| q.index()).collect()
    }
}

impl From<Vec<Quadrant>> for Address {
    fn from(quadrants: Vec<Quadrant>) -> Self {
        Self { quadrants }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        for q in &self.quadrants {
            write!(f, "{}", q.index())?;
        }
        Ok(())
    }
}
