//! Collision detection
//!
//! Pure functions over the current ball and wall sets. Nothing here mutates
//! state; the resolver consumes the returned contacts.

use super::state::{Ball, Status};
use super::vector::Vector2;
use super::wall::{SegmentFeature, Wall};

/// Two overlapping balls, by index into the active ball list (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallContact {
    pub a: usize,
    pub b: usize,
}

/// A ball touching a wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WallContact {
    /// Ball overlaps the body of the segment
    Segment { ball: usize, wall: usize },
    /// Ball came around the tip of a segment
    Endpoint { ball: usize, point: Vector2 },
}

/// Everything that touched this tick
#[derive(Debug, Clone, Default)]
pub struct Contacts {
    pub balls: Vec<BallContact>,
    pub walls: Vec<WallContact>,
}

/// Detect all contacts for the current (post-integration) positions
pub fn detect(balls: &[Ball], walls: &[Wall]) -> Contacts {
    Contacts {
        balls: ball_contacts(balls),
        walls: wall_contacts(balls, walls),
    }
}

/// Balls whose disks touch or overlap
#[inline]
pub fn balls_touch(a: &Ball, b: &Ball) -> bool {
    a.pos.distance(b.pos) <= a.radius() + b.radius()
}

/// Every unordered pair of touching balls.
///
/// Brute force O(n²); fine for a few hundred balls.
pub fn ball_contacts(balls: &[Ball]) -> Vec<BallContact> {
    let mut contacts = Vec::new();
    for (a, ball_a) in balls.iter().enumerate() {
        if ball_a.status() == Status::Dead {
            continue;
        }
        for (offset, ball_b) in balls[a + 1..].iter().enumerate() {
            if ball_b.status() != Status::Dead && balls_touch(ball_a, ball_b) {
                contacts.push(BallContact {
                    a,
                    b: a + 1 + offset,
                });
            }
        }
    }
    contacts
}

/// Swept ball/wall check.
///
/// If the ball's previous position projected onto an endpoint, the ball is
/// coming around the tip and only the endpoint is tested. Otherwise the
/// segment body is tested against the current position.
pub fn ball_wall_contact(
    ball: &Ball,
    wall: &Wall,
    ball_index: usize,
    wall_index: usize,
) -> Option<WallContact> {
    if let SegmentFeature::Endpoint(end) = wall.feature_at(ball.prev_pos) {
        let point = wall.endpoint(end);
        if point.distance(ball.pos) < ball.radius() {
            return Some(WallContact::Endpoint {
                ball: ball_index,
                point,
            });
        }
    }

    if wall.distance_to(ball.pos) < ball.radius() {
        return Some(WallContact::Segment {
            ball: ball_index,
            wall: wall_index,
        });
    }

    None
}

/// All ball/wall contacts, at most one per (ball, wall) pair
pub fn wall_contacts(balls: &[Ball], walls: &[Wall]) -> Vec<WallContact> {
    let mut contacts = Vec::new();
    for (bi, ball) in balls.iter().enumerate() {
        if ball.status() == Status::Dead {
            continue;
        }
        for (wi, wall) in walls.iter().enumerate() {
            if let Some(contact) = ball_wall_contact(ball, wall, bi, wi) {
                contacts.push(contact);
            }
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::wall::WallId;

    fn ball(x: f64, y: f64, r: f64) -> Ball {
        Ball::new(0, Vector2::new(x, y), Vector2::ZERO, r).unwrap()
    }

    fn moved(from: Vector2, to: Vector2, r: f64) -> Ball {
        let mut b = Ball::new(0, to, to - from, r).unwrap();
        b.prev_pos = from;
        b
    }

    fn horizontal_wall() -> Wall {
        Wall::new(WallId(0), Vector2::new(100.0, 100.0), Vector2::new(200.0, 100.0)).unwrap()
    }

    #[test]
    fn test_ball_contacts_pairs() {
        let balls = vec![
            ball(0.0, 0.0, 5.0),
            ball(10.0, 0.0, 5.0), // touching exactly
            ball(50.0, 0.0, 5.0),
            ball(55.0, 3.0, 5.0),
        ];
        let contacts = ball_contacts(&balls);
        assert_eq!(
            contacts,
            vec![BallContact { a: 0, b: 1 }, BallContact { a: 2, b: 3 }]
        );
    }

    #[test]
    fn test_dead_balls_ignored() {
        let balls = vec![
            ball(0.0, 0.0, 5.0),
            ball(3.0, 0.0, 5.0).with_status(Status::Dead, 0),
        ];
        assert!(ball_contacts(&balls).is_empty());
    }

    #[test]
    fn test_segment_contact() {
        let wall = horizontal_wall();
        let b = moved(Vector2::new(150.0, 92.0), Vector2::new(150.0, 96.0), 5.0);
        assert_eq!(
            ball_wall_contact(&b, &wall, 3, 7),
            Some(WallContact::Segment { ball: 3, wall: 7 })
        );

        let far = moved(Vector2::new(150.0, 80.0), Vector2::new(150.0, 90.0), 5.0);
        assert_eq!(ball_wall_contact(&far, &wall, 0, 0), None);
    }

    #[test]
    fn test_endpoint_contact_has_priority() {
        let wall = horizontal_wall();
        // Previous projection clamps to the start point; now within radius of it
        let b = moved(Vector2::new(94.0, 97.0), Vector2::new(97.0, 97.0), 5.0);
        assert_eq!(
            ball_wall_contact(&b, &wall, 0, 0),
            Some(WallContact::Endpoint {
                ball: 0,
                point: Vector2::new(100.0, 100.0)
            })
        );
        assert_eq!(wall_contacts(&[b], &[wall]).len(), 1);
    }

    #[test]
    fn test_endpoint_miss_falls_back_to_segment() {
        let wall = horizontal_wall();
        // Came from beyond the tip but now overlaps the body away from the tip
        let b = moved(Vector2::new(95.0, 80.0), Vector2::new(106.0, 97.0), 5.0);
        assert_eq!(
            ball_wall_contact(&b, &wall, 0, 0),
            Some(WallContact::Segment { ball: 0, wall: 0 })
        );
    }
}
