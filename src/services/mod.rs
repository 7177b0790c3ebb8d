pub mod evaluation;
pub mod ratings;
pub mod recommendation;
