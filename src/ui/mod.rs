pub mod details;
pub mod map;
pub mod panels;
