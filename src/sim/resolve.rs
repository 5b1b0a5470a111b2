//! Collision response
//!
//! Applies the contacts found by `collision::detect`: push overlapping things
//! apart, then reflect velocities. Everything is resolved in a single pass;
//! overlaps stay small at the speeds this runs at.

use super::collision::{BallContact, Contacts, WallContact};
use super::state::Ball;
use super::vector::{Vector2, Vector2Ext, ZERO_EPSILON};
use super::wall::Wall;

/// Below this the path is treated as parallel to the wall
const MIN_INCIDENCE_SIN: f64 = 1e-6;

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vector2, normal: Vector2) -> Vector2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Apply every contact of this tick: walls first, then ball pairs
pub fn resolve(balls: &mut [Ball], walls: &[Wall], contacts: &Contacts) {
    for contact in &contacts.walls {
        match *contact {
            WallContact::Segment { ball, wall } => bounce_wall(&mut balls[ball], &walls[wall]),
            WallContact::Endpoint { ball, point } => bounce_endpoint(&mut balls[ball], point),
        }
    }

    for &BallContact { a, b } in &contacts.balls {
        let (ball_a, ball_b) = pair_mut(balls, a, b);
        separate(ball_a, ball_b);
        bounce_balls(ball_a, ball_b);
    }
}

fn pair_mut(balls: &mut [Ball], a: usize, b: usize) -> (&mut Ball, &mut Ball) {
    debug_assert!(a < b);
    let (left, right) = balls.split_at_mut(b);
    (&mut left[a], &mut right[0])
}

/// Push two overlapping balls apart along the line between their centers,
/// half the overlap each. Coincident centers split along +x.
pub fn separate(a: &mut Ball, b: &mut Ball) {
    let delta = a.pos - b.pos;
    let overlap = a.radius() + b.radius() - delta.length();
    let axis = delta.unit().unwrap_or(Vector2::X);
    let push = axis * (overlap / 2.0);

    a.prev_pos = a.pos;
    b.prev_pos = b.pos;
    a.pos += push;
    b.pos -= push;
}

/// Elastic two-body collision along the center line, weighted by mass.
///
/// Pairs already moving apart are left alone: an overlapping pair that is
/// separating (for example one spawned on top of another) is only pushed apart
/// by `separate`, and keeps its velocities.
pub fn bounce_balls(a: &mut Ball, b: &mut Ball) {
    let axis = a.pos - b.pos;
    let dist_sq = axis.length_squared();
    if dist_sq <= ZERO_EPSILON {
        return;
    }

    let closing = (a.vel - b.vel).dot(axis);
    if closing >= 0.0 {
        return;
    }

    let scalar = closing / dist_sq;
    let total_mass = a.mass() + b.mass();
    a.vel -= axis * (2.0 * b.mass() / total_mass * scalar);
    b.vel += axis * (2.0 * a.mass() / total_mass * scalar);
}

/// Bounce a ball off the body of a wall.
///
/// The ball's path this tick (prev_pos -> pos) and its projection onto the wall
/// form a right triangle; with the incidence angle θ from that triangle, the
/// penetration depth `b` (perpendicular to the wall) corresponds to backing off
/// `b / sin θ` along the direction of travel. The velocity is then mirrored
/// about the wall normal.
pub fn bounce_wall(ball: &mut Ball, wall: &Wall) {
    let prev_proj = wall.projected_point(ball.prev_pos);
    let cur_proj = wall.projected_point(ball.pos);

    let travelled = ball.prev_pos.distance(ball.pos);
    let along_wall = prev_proj.distance(cur_proj);
    let gap = ball.pos.distance(cur_proj);

    // Did the center cross the wall line this tick?
    let same_side = (ball.prev_pos - prev_proj).dot(ball.pos - cur_proj) >= 0.0;
    let depth = if same_side {
        ball.radius() - gap
    } else {
        ball.radius() + gap
    };
    // An earlier contact this tick already moved the ball clear
    if depth <= 0.0 {
        return;
    }

    let corrected = swept_backoff(ball, travelled, along_wall, depth)
        .unwrap_or_else(|| push_out(ball, wall, cur_proj, same_side));

    ball.prev_pos = ball.pos;
    ball.pos = corrected;
    ball.vel = reflect_velocity(ball.vel, wall.normal());
}

/// Position backed off along the velocity by `depth / sin θ`, or `None` when the
/// triangle is degenerate (no travel, no velocity, travel parallel to the wall)
fn swept_backoff(ball: &Ball, travelled: f64, along_wall: f64, depth: f64) -> Option<Vector2> {
    if travelled <= ZERO_EPSILON {
        return None;
    }
    let theta = (along_wall / travelled).clamp(0.0, 1.0).acos();
    let sin = theta.sin();
    if sin < MIN_INCIDENCE_SIN {
        return None;
    }
    let backoff = ball.vel.scale_to(-depth / sin).ok()?;
    let pos = ball.pos + backoff;
    pos.is_finite().then_some(pos)
}

/// Fallback: put the ball tangent to the wall on the side it came from
fn push_out(ball: &Ball, wall: &Wall, cur_proj: Vector2, same_side: bool) -> Vector2 {
    let away = same_side
        .then(|| (ball.pos - cur_proj).unit().ok())
        .flatten()
        .unwrap_or_else(|| {
            if wall.signed_distance(ball.prev_pos) < 0.0 {
                -wall.normal()
            } else {
                wall.normal()
            }
        });
    cur_proj + away * ball.radius()
}

/// Bounce a ball off the tip of a wall, treating the tip as a point obstacle.
///
/// The ball is pushed out along tip -> center until it just touches, and the
/// velocity is mirrored about that direction.
pub fn bounce_endpoint(ball: &mut Ball, point: Vector2) {
    let away = (ball.pos - point)
        .unit()
        .or_else(|_| (-ball.vel).unit())
        .unwrap_or(Vector2::X);

    ball.prev_pos = ball.pos;
    ball.pos = point + away * ball.radius();
    ball.vel = reflect_velocity(ball.vel, away);
}
