pub mod demo;
pub mod lifecycle;
pub mod package;
