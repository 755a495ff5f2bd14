pub mod chat;
pub mod word;

pub use chat::*;
pub use word::*;
