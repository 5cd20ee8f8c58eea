//! Axis-aligned bounding boxes over vertex sets.

use crate::error::{GeomError, Result};
use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
///
/// Always derived from a non-empty vertex set, so `min <= max` holds
/// component-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a box from its corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Extent along X.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Extent along Y (the vertical axis of the scanning frame).
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Extent along Z.
    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Extents along all three axes.
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Compute the bounding box of a vertex sequence in a single pass.
///
/// Fails with [`GeomError::EmptyGeometry`] if the sequence is empty.
pub fn bounding_box<I>(points: I) -> Result<BoundingBox>
where
    I: IntoIterator<Item = Point3>,
{
    let mut points = points.into_iter();
    let first = points.next().ok_or(GeomError::EmptyGeometry)?;
    let mut bbox = BoundingBox::new(first, first);
    for p in points {
        bbox.include_point(&p);
    }
    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_is_error() {
        assert_eq!(
            bounding_box(Vec::<Point3>::new()),
            Err(GeomError::EmptyGeometry)
        );
    }

    #[test]
    fn test_single_point_is_degenerate_box() {
        let p = Point3::new(1.0, -2.0, 3.0);
        let bbox = bounding_box([p]).unwrap();
        assert_eq!(bbox.min, p);
        assert_eq!(bbox.max, p);
        assert_eq!(bbox.extents(), Vec3::zeros());
    }

    #[test]
    fn test_extents() {
        let bbox = bounding_box([
            Point3::new(0.2, 0.0, 0.0),
            Point3::new(0.0, 0.02, 0.1),
            Point3::new(0.1, 0.01, 0.4),
        ])
        .unwrap();
        assert_relative_eq!(bbox.width(), 0.2);
        assert_relative_eq!(bbox.height(), 0.02);
        assert_relative_eq!(bbox.depth(), 0.4);
    }

    #[test]
    fn test_min_never_exceeds_max() {
        // deterministic pseudo-random walk covering negative and positive coordinates
        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed as f32 / u32::MAX as f32) * 20.0 - 10.0
        };
        for n in 1..50 {
            let points: Vec<Point3> = (0..n).map(|_| Point3::new(next(), next(), next())).collect();
            let bbox = bounding_box(points.iter().copied()).unwrap();
            assert!(bbox.min.x <= bbox.max.x);
            assert!(bbox.min.y <= bbox.max.y);
            assert!(bbox.min.z <= bbox.max.z);
            for p in &points {
                assert!(p.x >= bbox.min.x && p.x <= bbox.max.x);
                assert!(p.y >= bbox.min.y && p.y <= bbox.max.y);
                assert!(p.z >= bbox.min.z && p.z <= bbox.max.z);
            }
        }
    }
}
