// Motion and observation models shared by the filter and the planner

pub mod range_bearing;
pub mod unicycle;

pub use range_bearing::{
    is_degenerate, observation_jacobian, observation_jacobian_with_floor, predict_observation,
    RangeBearingModel, MIN_RANGE_SQUARED,
};
pub use unicycle::{input_matrix, motion_jacobian, predict_pose, UnicycleModel};
