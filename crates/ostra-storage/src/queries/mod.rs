// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. One module per table family; every function takes a
//! [`crate::database::Database`] and routes through its single writer.

pub mod catalog;
pub mod identities;
pub mod orders;
pub mod queue;
