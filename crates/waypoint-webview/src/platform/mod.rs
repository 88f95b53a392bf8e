//! Real engine drivers, one per platform webview toolkit.

pub mod wry_engine;

pub use wry_engine::{WryEngine, WryEnginePump};
