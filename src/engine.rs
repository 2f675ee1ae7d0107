pub mod material_eval;
pub mod ranker;
pub mod ranking;

mod evaluator;

pub use evaluator::StaticEvaluator;
