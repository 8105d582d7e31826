// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered TOML + environment configuration for the Ostra service.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::OstraConfig;
