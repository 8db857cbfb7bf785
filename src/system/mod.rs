//! Sampling of `/proc` and `/sys`, rates between samples and the process
//! tree model. Nothing in here knows about the terminal.

pub mod battery;
pub mod collector;
pub mod cpu;
pub mod delta;
pub mod error;
pub mod memory;
pub mod process;
pub mod procfs;
pub mod security;
pub mod snapshot;
pub mod thermal;
pub mod tree;
pub mod users;

pub use collector::{Collector, SamplerPaths, SelinuxSource};
pub use error::SampleError;
