pub mod advisory;
pub mod incentives;
pub mod projection;
pub mod sizing;
