pub mod bundling_worker;

pub use bundling_worker::*;
