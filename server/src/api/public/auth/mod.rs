pub mod signup;
pub mod token;
