pub mod ai;
pub mod battle_actor;
pub mod room;
