//! Terminal user interface components.

pub mod viewer;

pub use viewer::TerminalViewer;
