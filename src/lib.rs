//! Purpose: Library crate behind the `dynjson` CLI: schema-less JSON value inference.
//! Exports: `api` (stable entry points and types), `core` (tokenizer, classifier, engine).
//! Role: Converts one JSON document into the most specific native value tree.
//! Invariants: Inference is a single forward pass with no shared mutable state.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
