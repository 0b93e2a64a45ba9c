pub mod admin;
pub mod attendance;
pub mod core;
pub mod roster;
pub mod stats;
pub mod test_scores;
