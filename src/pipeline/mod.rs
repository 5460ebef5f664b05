mod controller;
mod state;
mod worker;

pub use controller::PipelineController;
pub use state::PipelineState;
