pub mod attempt_pipeline;
