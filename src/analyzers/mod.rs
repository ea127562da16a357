pub mod tensor_analyzer;

pub use tensor_analyzer::{CellLocation, FieldStatistics, TensorAnalyzer, TensorStatistics};
