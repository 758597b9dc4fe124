pub mod entity;
pub mod management;
