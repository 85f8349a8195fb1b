//! The steps of the release pipeline.

mod download_artifact;
mod publish_release;
mod select_artifact;
mod select_run;

pub use download_artifact::*;
pub use publish_release::*;
pub use select_artifact::*;
pub use select_run::*;
