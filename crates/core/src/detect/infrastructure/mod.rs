pub mod contour;
pub mod hsv;
pub mod hsv_ball_detector;
pub mod morphology;
