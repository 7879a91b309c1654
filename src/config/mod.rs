// ABOUTME: Configuration module grouping environment-driven server settings
// ABOUTME: All configuration enters through environment variables, no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Configuration management

pub mod environment;

pub use environment::ServerConfig;
