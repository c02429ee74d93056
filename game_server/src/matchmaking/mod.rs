pub mod matchmaker;
pub mod session;
