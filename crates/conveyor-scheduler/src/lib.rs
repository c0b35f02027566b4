//! Stage sequencing for the Conveyor delivery pipeline.
//!
//! Assembles a product from configuration and drives it through its
//! stages in order.

pub mod assembly;
pub mod clock;
pub mod orchestrator;

pub use assembly::assemble_product;
pub use clock::{Sleeper, TokioSleeper};
pub use orchestrator::{Pipeline, PipelineEvent, PipelineOptions, PipelineResult, StageState};
