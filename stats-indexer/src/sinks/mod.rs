pub mod fixtures;
pub mod managers;
pub mod players;
pub mod team_stats;
pub mod teams;
pub mod unnest;

pub use fixtures::FixtureSink;
pub use managers::ManagerHistorySink;
pub use players::{PlayerHistoryWriter, PlayerPastWriter, PlayerSink};
pub use team_stats::TeamStatsSink;
pub use teams::TeamSink;
