use glam::Vec2;

/// A 2D axis-aligned bounding box represented by minimum and maximum points.
///
/// Image coordinates: `min` is the top-left corner, `max` the bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    /// The minimum point of the bounding box.
    pub min: Vec2,
    /// The maximum point of the bounding box.
    pub max: Vec2,
}

impl Bbox {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, `None` for an empty slice.
    pub fn enclosing(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        points.into_iter().fold(None, |acc, point| match acc {
            None => Some(Self::new(point, point)),
            Some(bbox) => Some(Self::new(bbox.min.min(point), bbox.max.max(point))),
        })
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Calculates the area of the bounding box.
    pub fn area(&self) -> f32 {
        let length = self.max - self.min;

        length.x * length.y
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Grow the box by `distance` on every side.
    pub fn expand(&self, distance: f32) -> Self {
        Self::new(self.min - Vec2::splat(distance), self.max + Vec2::splat(distance))
    }

    /// Scale both corners independently along each axis.
    pub fn scale_xy(&self, scale: Vec2) -> Self {
        Self::new(self.min * scale, self.max * scale)
    }

    /// Restrict the box to the `[min, max]` region.
    pub fn clamp(&self, min: Vec2, max: Vec2) -> Self {
        Self::new(self.min.clamp(min, max), self.max.clamp(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing() {
        let bbox = Bbox::enclosing([
            Vec2::new(3.0, 4.0),
            Vec2::new(1.0, 8.0),
            Vec2::new(5.0, 2.0),
        ])
        .unwrap();
        assert_eq!(bbox, Bbox::new(Vec2::new(1.0, 2.0), Vec2::new(5.0, 8.0)));
        assert!(Bbox::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_area_perimeter() {
        let bbox = Bbox::new(Vec2::ZERO, Vec2::new(4.0, 3.0));
        assert_eq!(bbox.area(), 12.0);
        assert_eq!(bbox.perimeter(), 14.0);
        assert_eq!(bbox.center(), Vec2::new(2.0, 1.5));
    }

    #[test]
    fn test_expand_scale_clamp() {
        let bbox = Bbox::new(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0));
        assert_eq!(
            bbox.expand(1.0),
            Bbox::new(Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0))
        );
        assert_eq!(
            bbox.scale_xy(Vec2::new(2.0, 0.5)),
            Bbox::new(Vec2::new(4.0, 1.0), Vec2::new(8.0, 2.0))
        );
        assert_eq!(
            bbox.expand(3.0).clamp(Vec2::ZERO, Vec2::new(6.0, 6.0)),
            Bbox::new(Vec2::ZERO, Vec2::new(6.0, 6.0))
        );
    }
}
