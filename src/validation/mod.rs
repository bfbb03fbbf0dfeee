pub mod logrank;
