//! Foundation utilities shared by every engine module

pub mod logging;
pub mod math;
pub mod time;
