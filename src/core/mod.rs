pub mod dataset;
pub mod demand;
pub mod dimensions;
pub mod errors;
pub mod event;
pub mod generator;
pub mod pipeline;
pub mod rng;
pub mod routing;
pub mod stream;
pub mod types;

#[cfg(test)]
mod tests;
