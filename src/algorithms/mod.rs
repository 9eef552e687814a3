pub mod counter;
pub mod embed;
pub mod graph;
pub mod miner;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod ranker;
pub mod shift;
