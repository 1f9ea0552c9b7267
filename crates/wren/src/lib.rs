// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the Wren runtime for the `wren` binary.

pub mod runtime;
pub mod serve;
pub mod shell;
pub mod terminal;

pub use runtime::Runtime;
