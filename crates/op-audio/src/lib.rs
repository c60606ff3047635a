//! Audio output backends for opnplay.

mod cpal_backend;
mod pull;
mod traits;

pub use cpal_backend::CpalOutput;
pub use pull::BlockPuller;
pub use traits::{AudioError, AudioOutput};
