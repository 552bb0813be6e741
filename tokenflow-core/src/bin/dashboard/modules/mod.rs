pub mod cli;
pub mod sheets;
