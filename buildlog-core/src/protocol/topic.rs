//! Topic naming

/// Prefix of per-build topics (`build:<id>`)
pub const DEFAULT_TOPIC_PREFIX: &str = "build";

/// Shared topic for an aggregate view over all builds
pub const DEFAULT_LOBBY_TOPIC: &str = "build:lobby";

/// Builds the topic for a single build: `<prefix>:<build_id>`
pub fn build_topic(prefix: &str, build_id: &str) -> String {
    format!("{}:{}", prefix, build_id)
}
