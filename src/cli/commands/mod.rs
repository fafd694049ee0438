pub mod contract;
pub mod merge;
pub mod process;
