//! Cover generation

use hecs::{Entity, World};
use rand::Rng;

use canyon_logic::geometry::Vec2;

use crate::components::Cover;
use crate::config::CoverLayout;

/// Spawn hand-placed covers, then the random scatter.
pub fn spawn_covers(world: &mut World, layout: &CoverLayout, rng: &mut impl Rng) -> Vec<Entity> {
    let mut covers: Vec<Entity> = layout
        .positions
        .iter()
        .map(|&p| world.spawn((Cover::new(p),)))
        .collect();

    if let Some(scatter) = &layout.scatter {
        covers.reserve(scatter.count);
        for _ in 0..scatter.count {
            let p = Vec2::new(
                rng.gen_range(scatter.min.x..=scatter.max.x),
                rng.gen_range(scatter.min.y..=scatter.max.y),
            );
            covers.push(world.spawn((Cover::new(p),)));
        }
    }

    tracing::debug!("spawned {} covers", covers.len());
    covers
}
