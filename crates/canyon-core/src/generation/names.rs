//! Callsign generation

use rand::Rng;

/// Pick a random callsign.
pub fn generate_callsign(rng: &mut impl Rng) -> &'static str {
    CALLSIGNS[rng.gen_range(0..CALLSIGNS.len())]
}

static CALLSIGNS: &[&str] = &[
    "Ash", "Badger", "Birch", "Bishop", "Cedar", "Cobra", "Condor", "Coyote", "Dingo", "Drake",
    "Ember", "Falcon", "Ferret", "Flint", "Fox", "Granite", "Hawk", "Heron", "Hornet", "Ibis",
    "Jackal", "Kestrel", "Lynx", "Mako", "Marten", "Mesa", "Moth", "Nomad", "Osprey", "Otter",
    "Pike", "Quarry", "Raven", "Ridge", "Rook", "Sable", "Scree", "Shale", "Sparrow", "Stoat",
    "Talon", "Thistle", "Viper", "Wadi", "Warden", "Wolf", "Wren", "Yucca",
];
