//! Command-line interface handlers

pub mod commands;

pub use commands::{
    build_demo_chain, cmd_decode, cmd_demo, cmd_keygen, load_config, CliResult,
};
