//! Collision proxies

pub mod collision;

pub use collision::OrientedBox;
