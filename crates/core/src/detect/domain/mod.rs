pub mod ball_detector;
