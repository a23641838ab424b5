//! Model and tokenizer components

pub mod inference;
pub mod loader;
pub mod sequence;
pub mod tokenizer;

pub use inference::{OnnxSentimentModel, SentimentModel};
pub use loader::ModelLoader;
pub use sequence::{pad_sequence, Truncating};
pub use tokenizer::KerasTokenizer;
