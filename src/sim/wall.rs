//! Wall segment geometry
//!
//! A wall is a straight segment between `p1` and `p2` with a cached unit normal.
//! Collision code needs the *clamped* projection onto the segment: a point whose
//! projection clamps to an endpoint is near the tip, not the body.

use serde::{Deserialize, Serialize};

use super::vector::{Vector2, Vector2Ext};
use crate::consts::ENDPOINT_TOLERANCE;
use crate::error::GeometryError;

/// Stable handle for a wall (survives removal of other walls)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// One end of a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallEnd {
    Start,
    End,
}

/// Where the clamped projection of a point lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFeature {
    Endpoint(WallEnd),
    Body,
}

/// A line-segment obstacle
#[derive(Debug, Clone, Serialize)]
pub struct Wall {
    id: WallId,
    p1: Vector2,
    p2: Vector2,
    /// Unit normal, perpendicular to `p2 - p1`
    normal: Vector2,
}

impl Wall {
    pub fn new(id: WallId, p1: Vector2, p2: Vector2) -> Result<Self, GeometryError> {
        let normal = segment_normal(p1, p2)?;
        Ok(Self { id, p1, p2, normal })
    }

    #[inline]
    pub fn id(&self) -> WallId {
        self.id
    }

    #[inline]
    pub fn p1(&self) -> Vector2 {
        self.p1
    }

    #[inline]
    pub fn p2(&self) -> Vector2 {
        self.p2
    }

    #[inline]
    pub fn normal(&self) -> Vector2 {
        self.normal
    }

    pub fn endpoint(&self, end: WallEnd) -> Vector2 {
        match end {
            WallEnd::Start => self.p1,
            WallEnd::End => self.p2,
        }
    }

    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    pub fn midpoint(&self) -> Vector2 {
        (self.p1 + self.p2) * 0.5
    }

    /// Projection parameter of `p`, clamped to [0, 1]
    pub fn projection_param(&self, p: Vector2) -> f64 {
        let seg = self.p2 - self.p1;
        ((p - self.p1).dot(seg) / seg.length_squared()).clamp(0.0, 1.0)
    }

    /// Closest point on the segment to `p`
    pub fn projected_point(&self, p: Vector2) -> Vector2 {
        self.p1 + (self.p2 - self.p1) * self.projection_param(p)
    }

    /// Euclidean distance from `p` to the segment
    pub fn distance_to(&self, p: Vector2) -> f64 {
        p.distance(self.projected_point(p))
    }

    /// Distance from `p` to the wall's infinite line, positive on the normal side
    pub fn signed_distance(&self, p: Vector2) -> f64 {
        (p - self.p1).dot(self.normal)
    }

    /// Which part of the segment is closest to `p`
    pub fn feature_at(&self, p: Vector2) -> SegmentFeature {
        let proj = self.projected_point(p);
        if proj.distance_squared(self.p1) < ENDPOINT_TOLERANCE * ENDPOINT_TOLERANCE {
            SegmentFeature::Endpoint(WallEnd::Start)
        } else if proj.distance_squared(self.p2) < ENDPOINT_TOLERANCE * ENDPOINT_TOLERANCE {
            SegmentFeature::Endpoint(WallEnd::End)
        } else {
            SegmentFeature::Body
        }
    }

    /// Move one endpoint. A move that would collapse the wall is rejected and
    /// leaves it untouched.
    pub fn set_endpoint(&mut self, end: WallEnd, p: Vector2) -> Result<(), GeometryError> {
        let (p1, p2) = match end {
            WallEnd::Start => (p, self.p2),
            WallEnd::End => (self.p1, p),
        };
        self.normal = segment_normal(p1, p2)?;
        self.p1 = p1;
        self.p2 = p2;
        Ok(())
    }

    /// Move the whole wall; orientation (and so the normal) is unchanged
    pub fn translate(&mut self, delta: Vector2) {
        self.p1 += delta;
        self.p2 += delta;
    }

    /// Hover test for wall editing.
    ///
    /// `None` when the wall is farther than `line_threshold` from `point`;
    /// otherwise `Some(end)` where `end` is the endpoint strictly closer than
    /// `point_threshold` (and closer than the other endpoint), if any.
    pub fn hover(
        &self,
        point: Vector2,
        line_threshold: f64,
        point_threshold: f64,
    ) -> Option<Option<WallEnd>> {
        if self.distance_to(point) >= line_threshold {
            return None;
        }
        let d1 = self.p1.distance(point);
        let d2 = self.p2.distance(point);
        if d1 < point_threshold && d1 < d2 {
            Some(Some(WallEnd::Start))
        } else if d2 < point_threshold && d2 < d1 {
            Some(Some(WallEnd::End))
        } else {
            Some(None)
        }
    }
}

fn segment_normal(p1: Vector2, p2: Vector2) -> Result<Vector2, GeometryError> {
    let d = p1 - p2;
    Vector2::new(-d.y, d.x)
        .unit()
        .map_err(|_| GeometryError::DegenerateWall { x: p1.x, y: p1.y })
}
