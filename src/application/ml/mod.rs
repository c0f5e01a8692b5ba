pub mod classifier;
pub mod evaluation;
pub mod inference;
pub mod logistic;
pub mod smartcore_classifier;
pub mod split;
pub mod trainer;
