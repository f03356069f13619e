// SPDX-License-Identifier: MPL-2.0

//! State core of the Questly social client: a feed cache with
//! duplicate-safe pagination, an achievement store with a progress state
//! machine, and the REST client and controller that feed them.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod runtime;
pub mod state;

pub use app::{App, AppError};
