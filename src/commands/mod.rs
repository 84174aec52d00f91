pub mod demo;
pub mod kinds;
pub mod list;
