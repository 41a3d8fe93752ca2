//! JSON renderings.

use anyhow::Result;
use pingmap_core::{ProviderRegistry, ResolvedUrlSet, RunOutcome};
use serde_json::json;

pub fn run(outcome: &RunOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

pub fn urls(sitemap: &str, urls: &ResolvedUrlSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "sitemap": sitemap,
        "count": urls.len(),
        "urls": urls,
    }))?)
}

pub fn providers(registry: &ProviderRegistry) -> Result<String> {
    let entries: Vec<serde_json::Value> = registry
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "kind": spec.kind,
                "endpoint": spec.endpoint,
                "requires": spec.required_inputs(),
                "note": spec.note,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingmap_core::{AggregateResult, SubmissionOutcome};
    use serde_json::Value;

    #[test]
    fn test_run_json_shape() {
        let outcome = RunOutcome::Failed(AggregateResult::from_outcomes(vec![
            SubmissionOutcome::error("google", "Submission failed", Some("HTTP 500".into())),
            SubmissionOutcome::warning("bing", "deprecated"),
        ]));
        let value: Value = serde_json::from_str(&run(&outcome).unwrap()).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["failed"], true);
        assert_eq!(value["outcomes"][0]["status"], "error");
        assert_eq!(value["outcomes"][0]["detail"], "HTTP 500");
        assert!(value["outcomes"][1].get("detail").is_none());
    }

    #[test]
    fn test_urls_json_shape() {
        let set: ResolvedUrlSet = ["https://example.com/b", "https://example.com/a"]
            .into_iter()
            .map(String::from)
            .collect();
        let value: Value =
            serde_json::from_str(&urls("https://example.com/sitemap.xml", &set).unwrap()).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["urls"][0], "https://example.com/a");
    }

    #[test]
    fn test_providers_json_lists_builtins() {
        let value: Value =
            serde_json::from_str(&providers(&ProviderRegistry::builtin()).unwrap()).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["google", "bing", "indexnow", "yandex"]);
        assert_eq!(value[2]["kind"], "indexnow");
        assert!(value[1]["endpoint"].is_null());
    }
}
