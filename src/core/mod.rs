//! The scoring pipeline: normalize -> features -> flags -> score ->
//! decide, with compare as composition over two runs. Every stage is
//! pure and owns its output.

pub mod compare;
pub mod engine;
pub mod features;
pub mod flags;
pub mod normalizer;
pub mod policy;
pub mod score;
