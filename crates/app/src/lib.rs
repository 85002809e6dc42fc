pub mod constants;
pub mod engine;
pub mod workers;

pub use engine::SamplerEngine;
