pub mod analysis;

pub use analysis::{
    AnalyzeRequest, AnalyzeResponse, CoachStatus, Signals, TaskContext, TaskSource, WorkState,
};
