//! Simulation engine - main entry point for running the simulation

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use canyon_logic::cover::{ClusterDetector, CoverError};
use canyon_logic::exposure::ExposureConfig;
use canyon_logic::finish::{CrossingOutcome, FinishZone};
use canyon_logic::geometry::Vec2;
use canyon_logic::grid::{Grid, GridError};

use crate::components::*;
use crate::config::{ConfigError, SimConfig};
use crate::generation::populate;
use crate::systems::*;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("grid: {0}")]
    Grid(#[from] GridError),
    #[error("cover: {0}")]
    Cover(#[from] CoverError),
    #[error("{0:?} is not a soldier")]
    NotASoldier(Entity),
    #[error("{0:?} is not a squad")]
    NotASquad(Entity),
    #[error("{0:?} is not a cover")]
    NotACover(Entity),
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all entities
    pub world: World,
    /// Simulation time in seconds since start
    pub sim_time: f64,
    grid: Grid,
    detector: ClusterDetector,
    exposure: ExposureConfig,
    finish_zone: Option<FinishZone>,
    /// Squad entities in scenario order
    squads: Vec<Entity>,
    /// Cover entities in spawn order; coordinator commands index into this
    covers: Vec<Entity>,
    time_scale: f32,
}

impl SimulationEngine {
    /// Build the grid and spawn the scenario. Squads with a destination are
    /// sent on their way immediately.
    pub fn new(config: &SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let grid = Grid::from_obstacles(config.grid, &config.obstacles)?;

        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let population = populate(&mut world, config, &mut rng);
        tracing::info!(
            "scenario ready: {}x{} grid, {} squads, {} covers",
            grid.size_x(),
            grid.size_y(),
            population.squads.len(),
            population.covers.len()
        );

        let mut engine = Self {
            world,
            sim_time: 0.0,
            grid,
            detector: config.detector,
            exposure: config.exposure,
            finish_zone: config.finish_zone,
            squads: population.squads,
            covers: population.covers,
            time_scale: 1.0,
        };

        for (spec, squad) in config.squads.iter().zip(engine.squads.clone()) {
            if let Some(destination) = spec.destination {
                engine.move_squad_to(squad, destination)?;
            }
        }
        Ok(engine)
    }

    /// Parse a JSON scenario and build the engine from it.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config = SimConfig::from_json_str(json)?;
        Self::new(&config)
    }

    /// Advance the simulation by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = delta_seconds * self.time_scale;
        if dt <= 0.0 {
            return;
        }
        self.sim_time += dt as f64;
        let now = self.sim_time;

        // Squad-level decisions first, on positions from the previous tick
        route_system(&mut self.world, &self.grid, now);
        coordinator_system(&self.world, &self.grid, &self.detector, &self.covers, now);

        // Per-soldier forces, then one integration step
        soldier_system(&mut self.world, dt);
        movement_system(&mut self.world, dt);

        exposure_system(&mut self.world, &self.exposure, dt, now);
        if let Some(zone) = &self.finish_zone {
            finish_system(&mut self.world, zone, now);
        }
    }

    /// Run fixed steps until nobody is left in the field or `max_seconds`
    /// of simulation time have passed.
    pub fn run_until_finished(&mut self, step: f32, max_seconds: f64) -> CrossingOutcome {
        while self.sim_time < max_seconds {
            self.update(step);
            if self.outcome().is_finished() {
                break;
            }
        }
        self.outcome()
    }

    // ── Soldier commands ──

    /// Point a soldier at a cover. The cover is claimed once the soldier
    /// enters a cover-holding state; a cover someone else holds is refused.
    pub fn assign_cover(&mut self, soldier: Entity, cover: Entity) -> Result<(), EngineError> {
        let occupant = self
            .world
            .get::<&Cover>(cover)
            .map(|c| c.occupant())
            .map_err(|_| EngineError::NotACover(cover))?;
        if occupant.is_some_and(|o| o != soldier) {
            return Err(CoverError::Occupied.into());
        }
        free_held_cover(&self.world, soldier);
        let mut assigned = self
            .world
            .get::<&mut AssignedCover>(soldier)
            .map_err(|_| EngineError::NotASoldier(soldier))?;
        assigned.cover = Some(cover);
        Ok(())
    }

    /// Free the soldier's cover and forget the assignment.
    pub fn release_cover(&mut self, soldier: Entity) -> Result<(), EngineError> {
        self.soldier_fsm(soldier)?;
        release_cover(&self.world, soldier);
        Ok(())
    }

    /// Whether the soldier is sitting in a cover it holds.
    pub fn is_in_cover(&self, soldier: Entity) -> bool {
        let in_state = self
            .world
            .get::<&StateMachine>(soldier)
            .is_ok_and(|f| f.is_in(SoldierState::InCover));
        let holds = self
            .world
            .get::<&AssignedCover>(soldier)
            .ok()
            .and_then(|a| a.cover)
            .and_then(|c| self.world.get::<&Cover>(c).ok().and_then(|c| c.occupant()))
            == Some(soldier);
        in_state && holds
    }

    /// Force a soldier into `state`, running enter/exit hooks. Returns the
    /// state the soldier ended up in, which differs from `state` when an
    /// enter hook redirected.
    pub fn set_soldier_state(
        &mut self,
        soldier: Entity,
        state: SoldierState,
    ) -> Result<SoldierState, EngineError> {
        self.soldier_fsm(soldier)?;
        transition_soldier(&self.world, soldier, state);
        self.soldier_state(soldier)
    }

    /// Undo the soldier's last transition. Returns the state it ended up in.
    pub fn revert_soldier_state(&mut self, soldier: Entity) -> Result<SoldierState, EngineError> {
        self.soldier_fsm(soldier)?;
        revert_soldier(&self.world, soldier);
        self.soldier_state(soldier)
    }

    pub fn soldier_state(&self, soldier: Entity) -> Result<SoldierState, EngineError> {
        self.soldier_fsm(soldier)
    }

    fn soldier_fsm(&self, soldier: Entity) -> Result<SoldierState, EngineError> {
        self.world
            .get::<&StateMachine>(soldier)
            .map(|f| f.current())
            .map_err(|_| EngineError::NotASoldier(soldier))
    }

    // ── Squad commands ──

    /// Plan a route for the squad and start marching. Returns whether a path
    /// was found; without one the route keeps retrying.
    pub fn move_squad_to(&mut self, squad: Entity, destination: Vec2) -> Result<bool, EngineError> {
        {
            let mut roster = self
                .world
                .get::<&mut Squad>(squad)
                .map_err(|_| EngineError::NotASquad(squad))?;
            roster.objective = Some(destination);
        }
        Ok(start_squad_route(
            &self.world,
            &self.grid,
            squad,
            destination,
            self.sim_time,
        ))
    }

    /// Pull every living member back to the squad centre.
    pub fn order_regroup(&mut self, squad: Entity) -> Result<(), EngineError> {
        for m in self.living_members(squad)? {
            transition_soldier(&self.world, m, SoldierState::Regrouping);
        }
        Ok(())
    }

    /// Drop the route, abandon any cover plan and bring everyone to a halt.
    pub fn stop_squad(&mut self, squad: Entity) -> Result<(), EngineError> {
        let members = self.living_members(squad)?;
        if let Ok(mut roster) = self.world.get::<&mut Squad>(squad) {
            roster.objective = None;
        }
        if let Ok(mut route) = self.world.get::<&mut SquadRoute>(squad) {
            route.stop();
        }
        if let Ok(mut coordinator) = self.world.get::<&mut Coordinator>(squad) {
            coordinator.reset();
        }
        for m in members {
            release_cover(&self.world, m);
            transition_soldier(&self.world, m, SoldierState::Idle);
        }
        Ok(())
    }

    pub fn living_members(&self, squad: Entity) -> Result<Vec<Entity>, EngineError> {
        let roster = self
            .world
            .get::<&Squad>(squad)
            .map_err(|_| EngineError::NotASquad(squad))?;
        Ok(living_members(&self.world, &roster))
    }

    pub fn squad_center(&self, squad: Entity) -> Option<Vec2> {
        squad_center(&self.world, squad)
    }

    pub fn cover_phase(&self, squad: Entity) -> Option<CoverPhase> {
        self.world.get::<&Coordinator>(squad).ok().map(|c| c.phase())
    }

    // ── Queries ──

    pub fn outcome(&self) -> CrossingOutcome {
        crossing_outcome(&self.world)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn detector(&self) -> &ClusterDetector {
        &self.detector
    }

    pub fn squads(&self) -> &[Entity] {
        &self.squads
    }

    pub fn covers(&self) -> &[Entity] {
        &self.covers
    }

    pub fn occupied_cover_count(&self) -> usize {
        self.covers
            .iter()
            .filter(|&&c| self.world.get::<&Cover>(c).is_ok_and(|c| c.is_occupied()))
            .count()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }
}
