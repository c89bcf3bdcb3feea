pub mod job;
pub mod suggestion;
