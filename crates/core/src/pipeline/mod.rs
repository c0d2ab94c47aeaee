pub mod config;
pub mod detect_ball_use_case;
pub mod pipeline_logger;
