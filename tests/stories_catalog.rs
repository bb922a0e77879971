// tests/stories_catalog.rs
//
// Story catalog loading (bundled and file override) and the builder registry
// applied to every chart the bundled stories list.

use std::fs;

use serde_json::json;

use story_dashboard::builders::BuilderRegistry;
use story_dashboard::chart::ChartKind;
use story_dashboard::config::AppConfig;
use story_dashboard::story::StoryCatalog;
use story_dashboard::AppState;

#[test]
fn bundled_story_charts_have_expected_types() {
    let catalog = StoryCatalog::bundled().expect("bundled catalog");
    let registry = BuilderRegistry::with_defaults();
    let expected = [
        ("gdp-growth-trajectory", ChartKind::Line),
        ("wage-growth-real", ChartKind::Area),
        ("productivity-international", ChartKind::Bar),
        ("regional-productivity", ChartKind::Bar),
        ("investment-share", ChartKind::Pie),
        ("sector-composition", ChartKind::Radial),
    ];

    let mut built = 0;
    for story in &catalog.stories {
        for id in story.available_charts(&registry) {
            let cfg = registry.build(id, &story.data).expect("available chart builds");
            let kind = expected
                .iter()
                .find(|(eid, _)| *eid == id)
                .map(|(_, k)| *k)
                .expect("known chart id");
            assert_eq!(cfg.kind, kind, "{id}");
            assert_eq!(cfg.id, id);
            assert!(!cfg.data.is_empty(), "{id}");
            assert!(!cfg.title.is_empty());
            built += 1;
        }
    }
    assert_eq!(built, 6);
}

#[test]
fn proportional_builders_never_emit_non_positive_values() {
    let catalog = StoryCatalog::bundled().unwrap();
    let registry = BuilderRegistry::with_defaults();
    let story = catalog.story("uk-productivity-puzzle").unwrap();
    for id in ["investment-share", "sector-composition"] {
        let cfg = registry.build(id, &story.data).unwrap();
        for row in &cfg.data {
            let v = row.get("value").and_then(|v| v.as_f64()).expect("value column");
            assert!(v > 0.0, "{id}: {row:?}");
        }
    }
}

#[test]
fn catalog_override_file_replaces_bundled_stories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stories.json");
    let doc = json!({
        "domains": [{"id": "health", "name": "Health"}],
        "stories": [{
            "id": "nhs-waiting-lists",
            "title": "Waiting lists",
            "domain": "health",
            "charts": ["sector-composition"],
            "data": {"sectors": [{"sector": "Acute", "share": 60}, {"sector": "Mental health", "share": 15}]}
        }]
    });
    fs::write(&path, doc.to_string()).unwrap();

    let catalog = StoryCatalog::load(Some(&path)).expect("override catalog");
    assert_eq!(catalog.stories.len(), 1);
    let story = catalog.story("nhs-waiting-lists").unwrap();
    assert_eq!(
        story.available_charts(&BuilderRegistry::with_defaults()),
        vec!["sector-composition"]
    );

    fs::write(&path, "{not json").unwrap();
    assert!(StoryCatalog::load(Some(&path)).is_err());
}

#[test]
fn app_state_follows_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stories.json");
    fs::write(&path, r#"{"stories": []}"#).unwrap();

    let cfg = AppConfig {
        stories_path: Some(path),
        simulate_missing_periods: false,
        ..AppConfig::default()
    };
    let state = AppState::from_config(&cfg).expect("state from config");
    assert!(state.catalog.stories.is_empty());
    assert!(state.fabricator.is_none());

    let bad = AppConfig {
        stories_path: Some(dir.path().join("absent.json")),
        ..AppConfig::default()
    };
    assert!(AppState::from_config(&bad).is_err());
}
