//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems and in `canyon-logic`.

mod cover;
mod soldier;
mod squad;

pub use cover::*;
pub use soldier::*;
pub use squad::*;
