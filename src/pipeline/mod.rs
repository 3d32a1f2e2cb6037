//! Training and evaluation pipeline
//!
//! One frame loop shared by every agent variant, with observers for progress
//! bars, metrics and JSONL recording.

pub mod observers;
pub mod training;

pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver, StepObservation,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Learner, Observer};
