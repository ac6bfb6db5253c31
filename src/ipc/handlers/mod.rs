pub mod attendance;
pub mod core;
pub mod courses;
pub mod resources;
pub mod scores;
pub mod summaries;
pub mod terms;
