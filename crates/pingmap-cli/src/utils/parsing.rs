//! Parsing helpers for repeatable `NAME=VALUE` flags.

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use url::Url;

/// Parse `--endpoint name=url` values into an override map.
///
/// Names are lowercased; a later entry for the same name wins.
pub fn parse_endpoints(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut endpoints = BTreeMap::new();
    for entry in raw {
        let (name, url) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid value for --endpoint '{entry}': expected NAME=URL"))?;
        let name = name.trim().to_lowercase();
        let url = url.trim();
        if name.is_empty() {
            return Err(anyhow!("Invalid value for --endpoint '{entry}': empty provider name"));
        }
        Url::parse(url)
            .map_err(|e| anyhow!("Invalid value for --endpoint '{entry}': {e}"))?;
        endpoints.insert(name, url.to_string());
    }
    Ok(endpoints)
}
