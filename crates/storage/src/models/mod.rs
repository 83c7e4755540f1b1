mod club;
mod fixture_match;
mod tournament;

pub use club::{Club, ClubId};
pub use fixture_match::{FixtureMatch, FixtureMatchDetail, Leg, NewFixtureMatch};
pub use tournament::{Tournament, TournamentId};
