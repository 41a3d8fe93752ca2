#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variables the CLI reads; cleared so the host environment
/// cannot leak into a test.
const ENV_INPUTS: &[&str] = &[
    "URL",
    "CONTEXT",
    "PINGMAP_CONFIG",
    "PINGMAP_SITEMAP_PATH",
    "PINGMAP_PROVIDERS",
    "PINGMAP_IGNORE_PERIOD",
    "PINGMAP_INDEXNOW_KEY",
    "PINGMAP_KEY_LOCATION",
    "PINGMAP_DRY_RUN",
    "PINGMAP_STATE_DIR",
];

/// Create a configured `pingmap` command suitable for integration tests.
#[allow(dead_code)]
pub fn pingmap_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pingmap"));
    cmd.timeout(CMD_TIMEOUT);
    for var in ENV_INPUTS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// `pingmap submit` for a production deploy of `base_url`, keeping state in `state_dir`.
#[allow(dead_code)]
pub fn submit_cmd(base_url: &str, state_dir: &Path) -> Command {
    let mut cmd = pingmap_cmd();
    cmd.arg("submit")
        .arg("--base-url")
        .arg(base_url)
        .arg("--context")
        .arg("production")
        .arg("--state-dir")
        .arg(state_dir);
    cmd
}

#[allow(dead_code)]
pub fn urlset(urls: &[&str]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{u}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

#[allow(dead_code)]
pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|u| format!("<sitemap><loc>{u}</loc></sitemap>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}
