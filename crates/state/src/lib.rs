pub mod resolve;
pub mod sampler;
pub mod slice;
pub mod window;
