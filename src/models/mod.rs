pub mod key;
pub mod project;
