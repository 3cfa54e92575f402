//! Rapier integration: shared world setup, the player rigid body, and the
//! collision queries the locomotion behaviours run every tick.
#![forbid(unsafe_code)]

use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

/// Collision group reserved for ladder volumes. Ladder raycasts filter on
/// this group; everything else collides normally.
pub const LADDER_GROUP: Group = Group::GROUP_2;

/// Default membership for world geometry.
pub const WORLD_GROUP: Group = Group::GROUP_1;

#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    pub distance: Real,
    pub point: Vector<Real>,
    pub normal: Vector<Real>,
}

/// Handle pair for a grapple spring: the impulse joint plus the fixed body
/// created at the anchor point. Both are removed together on detach.
#[derive(Clone, Copy, Debug)]
pub struct SpringHandle {
    joint: ImpulseJointHandle,
    anchor_body: RigidBodyHandle,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut RigidBodySet {
        &mut self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Inserts world geometry under `WORLD_GROUP` so ladder-only queries can
    /// filter it out.
    pub fn insert_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        let mut collider = collider;
        collider.set_collision_groups(InteractionGroups::new(WORLD_GROUP, Group::ALL));
        self.colliders.insert(collider)
    }

    /// Inserts a static collider tagged as a ladder volume. The sensor flag
    /// keeps solid collision off so the capsule can overlap it; the filter
    /// must stay permissive or ladder raycasts never pass the bidirectional
    /// group test.
    pub fn insert_ladder_collider(&mut self, collider: Collider) -> ColliderHandle {
        let mut collider = collider;
        collider.set_collision_groups(InteractionGroups::new(LADDER_GROUP, Group::ALL));
        collider.set_sensor(true);
        self.colliders.insert(collider)
    }

    /// Raycast against world geometry, skipping the given rigid body and all
    /// sensors (ladder volumes included).
    pub fn raycast(
        &self,
        origin: Vector<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        exclude: RigidBodyHandle,
    ) -> Option<SurfaceHit> {
        let ray = Ray::new(Point::from(origin), dir);
        let filter = QueryFilter::default()
            .exclude_rigid_body(exclude)
            .exclude_sensors();
        let (_, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        Some(SurfaceHit {
            distance: hit.time_of_impact,
            point: (origin + dir * hit.time_of_impact).into(),
            normal: hit.normal,
        })
    }

    /// Raycast that only sees ladder volumes.
    pub fn raycast_ladder(
        &self,
        origin: Vector<Real>,
        dir: Vector<Real>,
        max_distance: Real,
    ) -> Option<SurfaceHit> {
        let ray = Ray::new(Point::from(origin), dir);
        let filter = QueryFilter::default()
            .groups(InteractionGroups::new(Group::ALL, LADDER_GROUP));
        let (_, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        Some(SurfaceHit {
            distance: hit.time_of_impact,
            point: (origin + dir * hit.time_of_impact).into(),
            normal: hit.normal,
        })
    }

    /// Sweeps a capsule downward from `origin` and reports the nearest
    /// surface. Used by ground detection.
    pub fn cast_capsule_down(
        &self,
        origin: Vector<Real>,
        capsule: &Capsule,
        max_distance: Real,
        exclude: RigidBodyHandle,
    ) -> Option<SurfaceHit> {
        let pos = Isometry::translation(origin.x, origin.y, origin.z);
        let dir = -Vector::y();
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };
        let filter = QueryFilter::default()
            .exclude_rigid_body(exclude)
            .exclude_sensors();
        let (_, hit) = self.query_pipeline.cast_shape(
            &self.bodies,
            &self.colliders,
            &pos,
            &dir,
            capsule,
            options,
            filter,
        )?;
        let normal = hit.normal1.into_inner();
        Some(SurfaceHit {
            distance: hit.time_of_impact,
            point: hit.witness1.coords,
            normal,
        })
    }

    /// Attaches a spring joint between `body` and a fixed anchor created at
    /// `anchor` in world space.
    pub fn attach_spring(
        &mut self,
        body: RigidBodyHandle,
        anchor: Vector<Real>,
        rest_length: Real,
        stiffness: Real,
        damping: Real,
    ) -> SpringHandle {
        let anchor_body = self.bodies.insert(
            RigidBodyBuilder::fixed()
                .translation(anchor)
                .build(),
        );
        let joint = SpringJointBuilder::new(rest_length, stiffness, damping)
            .local_anchor1(Point::origin())
            .local_anchor2(Point::origin())
            .build();
        let joint = self.impulse_joints.insert(body, anchor_body, joint, true);
        SpringHandle { joint, anchor_body }
    }

    pub fn detach_spring(&mut self, handle: SpringHandle) {
        self.impulse_joints.remove(handle.joint, true);
        self.bodies.remove(
            handle.anchor_body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }
}

/// The player's dynamic rigid body: a locked-rotation capsule driven by
/// forces and impulses. All behaviour-side physics goes through this.
#[derive(Clone, Copy, Debug)]
pub struct PlayerBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    half_height: Real,
    radius: Real,
}

impl PlayerBody {
    pub fn spawn(
        world: &mut PhysicsWorld,
        position: Vector<Real>,
        capsule_height: Real,
        capsule_radius: Real,
        mass: Real,
    ) -> Self {
        let half_height = capsule_height * 0.5;
        let body = world.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(position)
                .lock_rotations()
                .ccd_enabled(true)
                .build(),
        );
        let collider = ColliderBuilder::capsule_y(half_height, capsule_radius)
            .mass(mass)
            .friction(0.0)
            .collision_groups(InteractionGroups::new(WORLD_GROUP, Group::ALL))
            .build();
        let collider = world
            .colliders
            .insert_with_parent(collider, body, &mut world.bodies);
        Self {
            body,
            collider,
            half_height,
            radius: capsule_radius,
        }
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn capsule(&self) -> Capsule {
        Capsule::new_y(self.half_height, self.radius)
    }

    /// Distance from body center to the lowest point of the capsule.
    pub fn foot_offset(&self) -> Real {
        self.half_height + self.radius
    }

    pub fn radius(&self) -> Real {
        self.radius
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vector<Real> {
        *world.bodies[self.body].translation()
    }

    pub fn set_position(&self, world: &mut PhysicsWorld, position: Vector<Real>) {
        world.bodies[self.body].set_translation(position, true);
    }

    pub fn velocity(&self, world: &PhysicsWorld) -> Vector<Real> {
        *world.bodies[self.body].linvel()
    }

    pub fn set_velocity(&self, world: &mut PhysicsWorld, velocity: Vector<Real>) {
        world.bodies[self.body].set_linvel(velocity, true);
    }

    /// Zeroes the vertical velocity component, leaving planar motion alone.
    pub fn zero_vertical_velocity(&self, world: &mut PhysicsWorld) {
        let mut v = *world.bodies[self.body].linvel();
        v.y = 0.0;
        world.bodies[self.body].set_linvel(v, true);
    }

    pub fn apply_impulse(&self, world: &mut PhysicsWorld, impulse: Vector<Real>) {
        world.bodies[self.body].apply_impulse(impulse, true);
    }

    /// Accumulates a continuous force for the current step. Cleared by the
    /// driver after each physics step.
    pub fn add_force(&self, world: &mut PhysicsWorld, force: Vector<Real>) {
        world.bodies[self.body].add_force(force, true);
    }

    pub fn clear_forces(&self, world: &mut PhysicsWorld) {
        world.bodies[self.body].reset_forces(true);
    }

    pub fn mass(&self, world: &PhysicsWorld) -> Real {
        world.bodies[self.body].mass()
    }

    pub fn gravity_scale(&self, world: &PhysicsWorld) -> Real {
        world.bodies[self.body].gravity_scale()
    }

    pub fn set_gravity_scale(&self, world: &mut PhysicsWorld, scale: Real) {
        world.bodies[self.body].set_gravity_scale(scale, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_floor(world: &mut PhysicsWorld) {
        let floor = ColliderBuilder::cuboid(10.0, 0.1, 10.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        world.insert_static_collider(floor);
    }

    #[test]
    fn player_body_falls_and_rests_on_floor() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        build_floor(&mut world);
        let player = PlayerBody::spawn(&mut world, vector![0.0, 2.0, 0.0], 1.8, 0.4, 80.0);
        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }
        let pos = player.position(&world);
        assert!(pos.y > 0.8 && pos.y < 1.5);
        assert!(player.velocity(&world).norm() < 0.1);
    }

    #[test]
    fn capsule_cast_reports_floor_normal() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        build_floor(&mut world);
        let player = PlayerBody::spawn(&mut world, vector![0.0, 1.5, 0.0], 1.8, 0.4, 80.0);
        world.step(1.0 / 60.0);

        let hit = world
            .cast_capsule_down(
                player.position(&world),
                &player.capsule(),
                2.0,
                player.handle(),
            )
            .unwrap();
        assert!(hit.normal.y > 0.99);
        assert!(hit.distance < 0.5);
    }

    #[test]
    fn ladder_raycast_ignores_world_and_world_raycast_ignores_ladder() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        build_floor(&mut world);
        let ladder = ColliderBuilder::cuboid(0.1, 2.0, 0.5)
            .translation(vector![0.0, 2.0, -1.0])
            .build();
        world.insert_ladder_collider(ladder);
        world.step(1.0 / 60.0);

        let origin = vector![0.0, 2.0, 0.0];
        let dir = vector![0.0, 0.0, -1.0];
        let ladder_hit = world.raycast_ladder(origin, dir, 3.0);
        assert!(ladder_hit.is_some());

        // The ladder-only query skips world geometry outright.
        let floor_probe = world.raycast_ladder(origin, vector![0.0, -1.0, 0.0], 3.0);
        assert!(floor_probe.is_none());

        let player = PlayerBody::spawn(&mut world, vector![0.0, 1.5, 3.0], 1.8, 0.4, 80.0);
        world.step(1.0 / 60.0);
        let world_hit = world.raycast(origin, dir, 3.0, player.handle());
        assert!(world_hit.is_none());
    }

    #[test]
    fn spring_pulls_body_toward_anchor() {
        let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
        let player = PlayerBody::spawn(&mut world, vector![0.0, 1.0, 0.0], 1.8, 0.4, 80.0);
        player.set_gravity_scale(&mut world, 0.0);
        let anchor = vector![0.0, 6.0, 0.0];
        let spring = world.attach_spring(player.handle(), anchor, 1.0, 4000.0, 200.0);
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        let before = (player.position(&world) - anchor).norm();
        assert!(before < 4.0);

        world.detach_spring(spring);
        world.step(1.0 / 60.0);
        let v = player.velocity(&world);
        assert!(v.norm().is_finite());
    }
}
