use glam::Vec2;

/// Damped reflection off the walls of the box domain.
///
/// Axes are resolved independently; a corner hit simply applies both axis
/// corrections. A particle can end a step slightly outside on one axis after
/// the other was corrected, which the next step fixes.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryPolicy {
    half_extent: Vec2,
    collision_damping: f32,
}

impl BoundaryPolicy {
    /// `half_bounds` is the domain half-extent; the collidable region shrinks
    /// by the particle radius so particles rest flush with the walls.
    pub fn new(half_bounds: Vec2, particle_radius: f32, collision_damping: f32) -> Self {
        Self {
            half_extent: half_bounds - Vec2::splat(particle_radius),
            collision_damping,
        }
    }

    pub fn resolve(&self, position: &mut Vec2, velocity: &mut Vec2) {
        if position.x.abs() > self.half_extent.x {
            position.x = self.half_extent.x * position.x.signum();
            velocity.x *= -self.collision_damping;
        }
        if position.y.abs() > self.half_extent.y {
            position.y = self.half_extent.y * position.y.signum();
            velocity.y *= -self.collision_damping;
        }
    }
}
