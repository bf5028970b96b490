pub mod assistant;
pub mod classifier;
pub mod processor;
pub mod prompt;
pub mod provider;

pub use assistant::Assistant;
