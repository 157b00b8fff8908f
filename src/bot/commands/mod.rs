pub mod admin;
pub mod attendance;
pub mod breaks;
pub mod location;
pub mod reports;
pub mod sessions;
pub mod status;
