// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "io.github.questly.Questly";
pub const APP_NAME: &str = "Questly";
/// Directory name under the XDG data dir
pub const APP_DIR: &str = "questly";

#[cfg(feature = "devel")]
pub const IS_DEVEL: bool = true;
#[cfg(not(feature = "devel"))]
pub const IS_DEVEL: bool = false;

/// Posts and users API
pub const DEFAULT_API_URL: &str = "http://localhost:3001";
/// Achievement catalog API
pub const DEFAULT_AWARDS_URL: &str = "http://localhost:4000";
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Local store key for the user's own achievements
pub const USER_AWARDS_KEY: &str = "userAwards";
