pub mod ability;
pub mod battle;
pub mod catalog;
pub mod determinism;
pub mod enums;
pub mod stats;
