pub mod cosine;
pub mod euclidean;
