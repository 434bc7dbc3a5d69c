pub mod instrument;
pub mod momentum;
pub mod recommendation;
