//! Static service/tool catalog.
//!
//! The catalog ships inside the binary (`data/catalog.yaml`) and is validated
//! once at startup. Stats and shields.io badge payloads are derived from it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.yaml");

const BADGE_PRIMARY_COLOR: &str = "00ff88";
const BADGE_SECONDARY_COLOR: &str = "00d4ff";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: String,
    pub name: String,
    pub category: String,
    pub tools: u32,
    #[serde(default)]
    pub triggers: u32,
    #[serde(default)]
    pub actions: u32,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    services: Vec<CatalogService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Total tool count across every service.
    pub total: u32,
    pub services: u32,
    pub categories: u32,
    pub triggers: u32,
    pub actions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub services: u32,
    pub tools: u32,
}

/// shields.io endpoint badge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<CatalogService>,
}

impl Catalog {
    #[must_use]
    pub fn services(&self) -> &[CatalogService] {
        &self.services
    }

    /// Categories in name order with their service and tool counts.
    #[must_use]
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut by_name: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        for service in &self.services {
            let entry = by_name.entry(service.category.as_str()).or_default();
            entry.0 += 1;
            entry.1 += service.tools;
        }
        by_name
            .into_iter()
            .map(|(name, (services, tools))| CategorySummary {
                name: name.to_string(),
                services,
                tools,
            })
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let categories: HashSet<&str> = self.services.iter().map(|s| s.category.as_str()).collect();
        CatalogStats {
            total: self.services.iter().map(|s| s.tools).sum(),
            services: u32::try_from(self.services.len()).unwrap_or(u32::MAX),
            categories: u32::try_from(categories.len()).unwrap_or(u32::MAX),
            triggers: self.services.iter().map(|s| s.triggers).sum(),
            actions: self.services.iter().map(|s| s.actions).sum(),
        }
    }

    /// Badge for one stat key, or `None` for an unknown key.
    #[must_use]
    pub fn badge(&self, key: &str) -> Option<Badge> {
        let stats = self.stats();
        let (value, color) = match key {
            "total" => (stats.total, BADGE_PRIMARY_COLOR),
            "services" => (stats.services, BADGE_PRIMARY_COLOR),
            "categories" => (stats.categories, BADGE_SECONDARY_COLOR),
            "triggers" => (stats.triggers, BADGE_SECONDARY_COLOR),
            "actions" => (stats.actions, BADGE_SECONDARY_COLOR),
            _ => return None,
        };
        Some(Badge {
            schema_version: 1,
            label: key.to_string(),
            message: value.to_string(),
            color: color.to_string(),
        })
    }
}

/// Parse and validate a catalog document.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogParse`] for malformed YAML and
/// [`ConfigError::CatalogInvalid`] for duplicate ids or blank names.
pub fn parse_catalog(yaml: &str) -> Result<Catalog, ConfigError> {
    let file: CatalogFile = serde_yaml::from_str(yaml)?;

    let mut seen = HashSet::new();
    for service in &file.services {
        if service.id.trim().is_empty() || service.name.trim().is_empty() {
            return Err(ConfigError::CatalogInvalid(format!(
                "service entry has blank id or name: {service:?}"
            )));
        }
        if !seen.insert(service.id.as_str()) {
            return Err(ConfigError::CatalogInvalid(format!(
                "duplicate service id '{}'",
                service.id
            )));
        }
    }

    Ok(Catalog {
        services: file.services,
    })
}

/// Load the catalog compiled into the binary.
///
/// # Errors
///
/// Returns [`ConfigError`] if the embedded document fails to parse or validate.
pub fn load_catalog() -> Result<Catalog, ConfigError> {
    parse_catalog(EMBEDDED_CATALOG)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "
services:
  - id: a
    name: Alpha
    category: x
    tools: 3
    triggers: 1
  - id: b
    name: Beta
    category: y
    tools: 4
    actions: 2
  - id: c
    name: Gamma
    category: x
    tools: 5
";

    #[test]
    fn embedded_catalog_loads() {
        let catalog = load_catalog().expect("embedded catalog");
        let stats = catalog.stats();
        assert_eq!(stats.services, 16);
        assert_eq!(stats.categories, 9);
        assert_eq!(stats.total, 395);
    }

    #[test]
    fn stats_sum_tools_and_count_distinct_categories() {
        let catalog = parse_catalog(SMALL).expect("catalog");
        let stats = catalog.stats();
        assert_eq!(stats.total, 12);
        assert_eq!(stats.services, 3);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.triggers, 1);
        assert_eq!(stats.actions, 2);
    }

    #[test]
    fn categories_are_sorted_with_counts() {
        let catalog = parse_catalog(SMALL).expect("catalog");
        let categories = catalog.categories();
        assert_eq!(
            categories,
            vec![
                CategorySummary {
                    name: "x".to_string(),
                    services: 2,
                    tools: 8,
                },
                CategorySummary {
                    name: "y".to_string(),
                    services: 1,
                    tools: 4,
                },
            ]
        );
    }

    #[test]
    fn total_badge_uses_primary_color() {
        let catalog = parse_catalog(SMALL).expect("catalog");
        let badge = catalog.badge("total").expect("total badge");
        let json = serde_json::to_value(&badge).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "schemaVersion": 1,
                "label": "total",
                "message": "12",
                "color": "00ff88",
            })
        );
    }

    #[test]
    fn unknown_badge_is_none() {
        let catalog = parse_catalog(SMALL).expect("catalog");
        assert!(catalog.badge("bogus").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = "
services:
  - { id: a, name: A, category: x, tools: 1 }
  - { id: a, name: B, category: x, tools: 1 }
";
        assert!(matches!(
            parse_catalog(yaml),
            Err(ConfigError::CatalogInvalid(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            parse_catalog("services: [not, a, service]"),
            Err(ConfigError::CatalogParse(_))
        ));
    }
}
