//! Keeping the actor on the walkable map.
//!
//! The renderer owns the map geometry, so the core only asks a
//! [`GroundQuery`] where a ray meets it. Rays start `ray_height` above the
//! feet and travel along the actor's down axis, so a walker standing on a
//! wall after a corner casts against the wall.

use glam::Vec3;

use crate::actor::ActorState;

/// Ray queries against the walkable map
pub trait GroundQuery {
    /// Nearest walkable point along the ray, if the ray hits the map
    fn cast(&mut self, origin: Vec3, direction: Vec3) -> Option<Vec3>;
}

/// Walkable point under the actor's feet
pub fn ground_below(
    actor: &ActorState,
    query: &mut dyn GroundQuery,
    ray_height: f32,
) -> Option<Vec3> {
    let down = -actor.axes().up;
    let origin = actor.foot_contact() - down * ray_height;
    query.cast(origin, down)
}

/// Put the actor's feet on the map. Returns false, leaving the actor
/// untouched, when there is no ground below.
pub fn settle(actor: &mut ActorState, query: &mut dyn GroundQuery, ray_height: f32) -> bool {
    match ground_below(actor, query, ray_height) {
        Some(ground) => {
            actor.place_foot_at(ground);
            true
        }
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    /// Square horizontal slab centered on the origin
    pub(crate) struct Slab {
        pub height: f32,
        pub half_extent: f32,
        pub casts: usize,
    }

    impl Slab {
        pub(crate) fn new(height: f32, half_extent: f32) -> Self {
            Self {
                height,
                half_extent,
                casts: 0,
            }
        }
    }

    impl GroundQuery for Slab {
        fn cast(&mut self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
            self.casts += 1;
            if direction.y.abs() < 1e-6 {
                return None;
            }
            let t = (self.height - origin.y) / direction.y;
            if t < 0.0 {
                return None;
            }
            let hit = origin + direction * t;
            (hit.x.abs() <= self.half_extent && hit.z.abs() <= self.half_extent).then_some(hit)
        }
    }

    #[test]
    fn test_settle_lifts_feet_onto_slab() {
        let mut slab = Slab::new(0.75, 5.0);
        let mut actor = ActorState::standing_at(Vec3::new(1.0, 0.0, -2.0), Quat::IDENTITY, 0.02, 1.0);

        assert!(settle(&mut actor, &mut slab, 2.0));
        assert!(actor
            .foot_contact()
            .abs_diff_eq(Vec3::new(1.0, 0.75, -2.0), 1e-5));
        assert!((actor.position.y - 0.77).abs() < 1e-5);
    }

    #[test]
    fn test_settle_off_map_leaves_actor() {
        let mut slab = Slab::new(0.0, 1.0);
        let mut actor = ActorState::standing_at(Vec3::new(3.0, 0.4, 0.0), Quat::IDENTITY, 0.0, 1.0);
        let before = actor;

        assert!(!settle(&mut actor, &mut slab, 2.0));
        assert_eq!(actor, before);
    }

    #[test]
    fn test_ray_follows_actor_down_axis() {
        // feet on a wall: up is +X after rolling about Z
        let actor = ActorState::standing_at(
            Vec3::new(0.5, 1.0, 0.0),
            Quat::from_rotation_z(-FRAC_PI_2),
            0.0,
            1.0,
        );

        struct Recorder(Vec<(Vec3, Vec3)>);
        impl GroundQuery for Recorder {
            fn cast(&mut self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
                self.0.push((origin, direction));
                None
            }
        }

        let mut recorder = Recorder(Vec::new());
        assert!(ground_below(&actor, &mut recorder, 2.0).is_none());
        let (origin, direction) = recorder.0[0];
        assert!(direction.abs_diff_eq(Vec3::NEG_X, 1e-5));
        assert!(origin.abs_diff_eq(Vec3::new(2.5, 1.0, 0.0), 1e-5));
    }
}
