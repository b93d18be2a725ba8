//! beacon-setup library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod check;
pub mod cli;
pub mod command_runner;
pub mod config;
pub mod control;
pub mod download;
pub mod error;
pub mod install;
pub mod os;
pub mod output;
pub mod paths;
pub mod privilege;
pub mod receipt;
pub mod setup;
