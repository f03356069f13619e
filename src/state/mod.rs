// SPDX-License-Identifier: MPL-2.0

mod session;
pub mod settings;
mod store;

pub use session::SessionState;
pub use settings::{AppSettings, ThemeMode};
pub use store::{Action, Effect, Store};
