pub mod extract_handlers;

pub use extract_handlers::*;
