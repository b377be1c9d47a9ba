// Core modules implementing tokenization, value inference, and error modeling.
pub mod composite;
pub mod cursor;
pub mod describe;
pub mod engine;
pub mod error;
pub mod extract;
pub mod scalar;
pub mod token;
pub mod value;
