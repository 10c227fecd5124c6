/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod config;
pub mod relay;
pub mod server;

pub use config::RelayConfig;
pub use relay::{PrintRelay, RelayError};
