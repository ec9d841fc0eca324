//! Cover components.

use hecs::Entity;

use canyon_logic::cover::CoverObject;

/// A cover point; the occupant is the soldier entity holding it.
pub type Cover = CoverObject<Entity>;
