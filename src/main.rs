// SPDX-License-Identifier: MPL-2.0

use questly::api::{Session, User};
use questly::cache::{CacheDb, FeedContext};
use questly::config::IS_DEVEL;
use questly::state::AppSettings;
use questly::{App, runtime};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Usage: `questly [profile-user-id]`
///
/// Reads `QUESTLY_USER` and `QUESTLY_TOKEN` for the session, prints the
/// first page of the global feed (or one profile's feed) and a summary of
/// the locally tracked achievements.
fn main() -> ExitCode {
    let default_filter = if IS_DEVEL { "questly=debug" } else { "questly=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let context = match std::env::args().nth(1) {
        Some(user_id) => FeedContext::Profile(user_id),
        None => FeedContext::Global,
    };
    let user_id = std::env::var("QUESTLY_USER").ok();
    let token = std::env::var("QUESTLY_TOKEN").ok();

    let db = match CacheDb::open(user_id.as_deref().unwrap_or("anonymous")) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("Local store unavailable, achievements won't persist: {}", e);
            None
        }
    };

    let mut app = match App::new(AppSettings::load(), db) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let (Some(user_id), Some(token)) = (user_id, token) {
        app.login(Session {
            user: User {
                id: user_id,
                first_name: String::new(),
                last_name: String::new(),
                friends: Vec::new(),
                picture_path: None,
            },
            token,
        });
    }

    match runtime::block_on(app.open_feed(context)) {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            error!("Failed to load feed: {}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    }

    for post in app.store().feed().posts() {
        println!(
            "{}  {}  ♥ {}  💬 {}",
            post.author_name(),
            post.text,
            post.like_count(),
            post.comments.len()
        );
    }
    if !app.store().feed().is_exhausted() {
        println!("… more posts available");
    }

    for achievement in app.store().achievements().owned() {
        println!(
            "{} {}  {}/{} ({:.0}%)",
            achievement.icon,
            achievement.title,
            achievement.current,
            achievement.target,
            achievement.ratio() * 100.0
        );
    }

    let stats = app.stats();
    println!(
        "achievements: {}/{} completed ({}%)",
        stats.completed, stats.total, stats.percent
    );

    // Writes defaults on first run so the endpoints can be edited
    if let Err(e) = app.save_settings() {
        warn!("Failed to save settings: {}", e);
    }

    ExitCode::SUCCESS
}
