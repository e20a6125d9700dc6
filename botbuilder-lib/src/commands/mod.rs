pub mod assistant;
pub mod help;
pub mod register;
