/// Line-oriented text helpers
pub mod text;

pub use text::*;
