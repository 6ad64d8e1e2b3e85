//! mp3-recorder - live audio capture encoded straight to MP3
//!
//! Captures PCM from the default input device into a small pool of reusable
//! buffers, encodes each filled buffer with LAME as it arrives, and appends the
//! frames to a file for a fixed recording duration.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: PCM format, buffers and buffer pool, session state machine, errors
//! - **Application**: Port traits and the recording pipeline
//! - **Infrastructure**: Adapter implementations (cpal, LAME, file output, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and logging setup

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
