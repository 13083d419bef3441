//! Project domain

mod entity;

pub use entity::Project;
