//! Canyon Core - squad canyon crossing simulation engine
//!
//! An ECS-based simulation of soldier squads crossing a canyon, hopping
//! between clusters of cover before exposure kills them.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: soldiers, squads, covers
//! - **Components**: pure data attached to entities (MovementController, StateMachine, Squad, etc.)
//! - **Systems**: logic that queries and updates components, run by [`engine::SimulationEngine`]
//!
//! The algorithms themselves (grid, A*, steering, FSM, clustering) live in
//! `canyon_logic` and know nothing about the ECS.
//!
//! # Example
//!
//! ```rust,no_run
//! use canyon_core::prelude::*;
//!
//! let config = SimConfig::from_json_file("scenario.json").unwrap();
//! let mut engine = SimulationEngine::new(&config).unwrap();
//!
//! let outcome = engine.run_until_finished(1.0 / 30.0, 300.0);
//! println!("{} rescued, {} fallen", outcome.rescued, outcome.fallen);
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{ConfigError, SimConfig, SquadSpec};
    pub use crate::engine::{EngineError, SimulationEngine};
    pub use canyon_logic::finish::{CrossingOutcome, FinishZone};
    pub use canyon_logic::geometry::Vec2;
}
