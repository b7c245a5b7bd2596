pub mod aggregator;
pub mod difficulty;
pub mod geo;
pub mod open_meteo;
pub mod rate_limit;
pub mod sampler;
pub mod stitcher;
