pub mod fixture_generation;
pub mod pairing;
