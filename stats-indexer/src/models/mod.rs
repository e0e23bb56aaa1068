pub mod de;
pub mod fixtures;
pub mod managers;
pub mod players;
pub mod stats;
pub mod team_stats;
pub mod teams;

pub use fixtures::{Fixture, FixtureMessage, FixtureStat, StatElement};
pub use managers::{EntryChip, EntryGameweek, EntryHistory, EntryHistoryMessage, EntryPastSeason};
pub use players::{
    PlayerBootstrap, PlayerBootstrapMessage, PlayerHistory, PlayerHistoryMessage,
    PlayerPastHistory, PlayerPastMessage,
};
pub use stats::MatchStats;
pub use team_stats::{TeamOverallStats, TeamOverallStatsMessage};
pub use teams::{Team, TeamMessage};
