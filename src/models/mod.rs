pub mod doctor;
pub mod feedback;

pub use doctor::*;
pub use feedback::*;
