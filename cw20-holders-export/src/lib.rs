//! CW20 holder snapshot exporter library.
//!
//! Resolves configuration, walks a CW20 contract's holders through
//! [`cw20_holders`], and writes the result as a JSON file.

pub mod config;
pub mod export;
pub mod snapshot;
