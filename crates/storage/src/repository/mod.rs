pub mod fixture;
pub mod tournament;
