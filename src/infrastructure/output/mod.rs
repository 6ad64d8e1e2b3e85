//! Output infrastructure module

mod file_sink;

pub use file_sink::FileSink;
