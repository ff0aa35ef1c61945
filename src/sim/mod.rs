pub mod assembler;
pub mod author;
pub mod movement;
pub mod orchestrator;
pub mod progress;
pub mod store;
