use crate::cluster::HealthStatus;
use crate::cluster::TemplateSpec;

#[test]
fn test_severity_ordering() {
    // GREEN is better than YELLOW is better than RED
    assert!(HealthStatus::Green.severity() < HealthStatus::Yellow.severity());
    assert!(HealthStatus::Yellow.severity() < HealthStatus::Red.severity());
}

#[test]
fn test_at_least_matches_numeric_ordering() {
    assert!(HealthStatus::Green.at_least(HealthStatus::Green));
    assert!(HealthStatus::Green.at_least(HealthStatus::Yellow));
    assert!(HealthStatus::Green.at_least(HealthStatus::Red));

    assert!(HealthStatus::Yellow.at_least(HealthStatus::Yellow));
    assert!(HealthStatus::Yellow.at_least(HealthStatus::Red));
    assert!(!HealthStatus::Yellow.at_least(HealthStatus::Green));

    assert!(HealthStatus::Red.at_least(HealthStatus::Red));
    assert!(!HealthStatus::Red.at_least(HealthStatus::Yellow));
    assert!(!HealthStatus::Red.at_least(HealthStatus::Green));
}

#[test]
fn test_status_display_is_lowercase_color() {
    assert_eq!(HealthStatus::Green.to_string(), "green");
    assert_eq!(HealthStatus::Yellow.to_string(), "yellow");
    assert_eq!(HealthStatus::Red.to_string(), "red");
}

fn template(patterns: &[&str]) -> TemplateSpec {
    TemplateSpec {
        name: "t".to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        order: 0,
        settings: Default::default(),
    }
}

#[test]
fn test_template_wildcard_matching() {
    assert!(template(&["*"]).matches("anything"));
    assert!(template(&["logs-*"]).matches("logs-2024"));
    assert!(!template(&["logs-*"]).matches("metrics-2024"));
    assert!(template(&["exact"]).matches("exact"));
    assert!(!template(&["exact"]).matches("exact-no"));
    assert!(template(&["metrics-*", "exact"]).matches("exact"));
}
