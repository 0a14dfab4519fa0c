//! Domain entities: the three source collections of an ownership chart

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::DomainError;
use crate::domain::graph::Link;

/// A legal entity (company, fund, trust, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(alias = "ENTITY_ID")]
    pub id: String,
    #[serde(alias = "ENTITY_NAME")]
    pub name: String,
    /// Tax jurisdiction, e.g. "DE" or "Cayman Islands"
    #[serde(default, alias = "ENTITY_TAX_JURISDICTION")]
    pub jurisdiction: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            jurisdiction: None,
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Case-insensitive substring match on name or id.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}

/// Directed ownership edge: `parent_id` holds `percentage` of `child_id`.
///
/// Percentages are not validated. Sibling stakes may sum above 100 and
/// malformed values are kept as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRelation {
    #[serde(alias = "PARENT_ID")]
    pub parent_id: String,
    #[serde(alias = "CHILD_ID")]
    pub child_id: String,
    #[serde(
        alias = "OWNERSHIP_PERC",
        default = "malformed_percentage",
        deserialize_with = "lenient_percentage"
    )]
    pub percentage: f64,
}

impl OwnershipRelation {
    pub fn new(parent_id: impl Into<String>, child_id: impl Into<String>, percentage: f64) -> Self {
        Self {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
            percentage,
        }
    }
}

fn malformed_percentage() -> f64 {
    f64::NAN
}

/// Accepts numbers, numeric strings ("12.5", " 40 "), and null.
/// Anything that does not parse becomes NaN instead of failing the load.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(f64::NAN),
        None => f64::NAN,
    })
}

/// A natural person, optionally affiliated with one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(alias = "PERSON_ID")]
    pub id: String,
    #[serde(alias = "PERSON_NAME")]
    pub name: String,
    #[serde(default, alias = "PERSON_ROLE")]
    pub role: Option<String>,
    /// Entity this person belongs to; without it the person is never charted
    #[serde(default, alias = "ENTITY_ID")]
    pub entity_id: Option<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            entity_id: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn at_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}

/// The full, unfiltered dataset of one chart.
///
/// Replaced wholesale on reload; everything derived from it is recomputed
/// per query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default, alias = "relations")]
    pub ownership: Vec<OwnershipRelation>,
    #[serde(default)]
    pub persons: Vec<Person>,
}

impl Dataset {
    pub fn new(
        entities: Vec<Entity>,
        ownership: Vec<OwnershipRelation>,
        persons: Vec<Person>,
    ) -> Self {
        Self {
            entities,
            ownership,
            persons,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// All ownership relations as traversal links, in source order.
    pub fn ownership_links(&self) -> Vec<Link> {
        self.ownership
            .iter()
            .map(|rel| Link::ownership(&rel.parent_id, &rel.child_id, rel.percentage))
            .collect()
    }

    /// Resolve a user query to an entity.
    ///
    /// An exact (case-insensitive) id match wins; otherwise the first entity
    /// whose name contains the query.
    pub fn find_entity(&self, query: &str) -> Result<&Entity, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        let needle = query.to_lowercase();

        self.entities
            .iter()
            .find(|e| e.id.to_lowercase() == needle)
            .or_else(|| {
                self.entities
                    .iter()
                    .find(|e| e.name.to_lowercase().contains(&needle))
            })
            .ok_or_else(|| DomainError::EntityNotFound(query.to_string()))
    }

    /// Entities sorted by name for browsing, optionally narrowed by a
    /// case-insensitive substring on name or id.
    pub fn browse_entities(&self, search: Option<&str>) -> Vec<&Entity> {
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        self.entities
            .iter()
            .filter(|e| e.matches_search(&needle))
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    /// Distinct jurisdictions, sorted, for a filter picker.
    pub fn jurisdictions(&self) -> Vec<String> {
        self.entities
            .iter()
            .filter_map(|e| e.jurisdiction.as_deref())
            .map(str::trim)
            .filter(|j| !j.is_empty() && *j != "None")
            .unique()
            .sorted()
            .map(str::to_string)
            .collect()
    }
}
