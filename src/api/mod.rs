pub mod appointments;
pub mod doctors;
pub mod feedback;
pub mod health;
pub mod swagger;
pub mod users;
