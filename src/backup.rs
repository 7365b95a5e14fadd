pub mod mode;
pub mod orchestrator;
pub mod set_namer;
