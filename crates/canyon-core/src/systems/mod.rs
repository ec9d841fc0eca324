//! Systems - logic that operates on components

mod coordinator;
mod exposure;
mod finish;
mod movement;
mod route;
mod soldier;
mod squad;

pub use coordinator::*;
pub use exposure::*;
pub use finish::*;
pub use movement::*;
pub use route::*;
pub use soldier::*;
pub use squad::*;
