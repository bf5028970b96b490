pub mod address;
pub mod background;
pub mod engine;
pub mod page;
pub mod settings;

pub use address::resolve_address;
pub use engine::Browser;
