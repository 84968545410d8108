pub mod euclidean;
