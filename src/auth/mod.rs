pub mod bearer;
pub mod tokens;
