//! Pure squad movement logic for Canyon.
//!
//! This crate contains all decision making that is independent of the ECS
//! engine. Functions take plain data and return forces, paths, transitions
//! or commands, which keeps them unit-testable and lets the engine stay a
//! thin scheduling layer.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`behavior`] | Per-state steering mix and follow-up transitions |
//! | [`config`] | Squad tuning defaults and value validation |
//! | [`coordinator`] | Squad-level Moving / GoingToCover / InCover loop |
//! | [`cover`] | Cover occupancy and cover clustering |
//! | [`decision`] | Whether a squad may leave cover |
//! | [`exposure`] | Time-out-of-cover accumulator |
//! | [`finish`] | Finish zone and crossing outcome |
//! | [`fsm`] | Soldier state machine with enter/exit hooks |
//! | [`geometry`] | 2D vector math on the canyon floor |
//! | [`grid`] | Walkable/blocked cell grid |
//! | [`movement`] | Force integration into velocity and position |
//! | [`pathfinding`] | A* over the grid and path simplification |
//! | [`route`] | Squad route following and replanning |
//! | [`steering`] | Arrive, seek, separation, cohesion, alignment |

pub mod behavior;
pub mod config;
pub mod coordinator;
pub mod cover;
pub mod decision;
pub mod exposure;
pub mod finish;
pub mod fsm;
pub mod geometry;
pub mod grid;
pub mod movement;
pub mod pathfinding;
pub mod route;
pub mod steering;
