//! Collection schema settings and naming rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Distance metric used for similarity search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    #[default]
    #[serde(rename = "COSINE")]
    Cosine,
    #[serde(rename = "L2")]
    L2,
    #[serde(rename = "IP")]
    Ip,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::Cosine => write!(f, "COSINE"),
            MetricType::L2 => write!(f, "L2"),
            MetricType::Ip => write!(f, "IP"),
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COSINE" => Ok(MetricType::Cosine),
            "L2" | "EUCLIDEAN" => Ok(MetricType::L2),
            "IP" | "INNER_PRODUCT" => Ok(MetricType::Ip),
            _ => Err(format!("unknown metric type: {}", s)),
        }
    }
}

/// Index built on the vector field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    #[default]
    #[serde(rename = "AUTOINDEX")]
    AutoIndex,
    #[serde(rename = "IVF_FLAT")]
    IvfFlat,
    #[serde(rename = "HNSW")]
    Hnsw,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::AutoIndex => write!(f, "AUTOINDEX"),
            IndexType::IvfFlat => write!(f, "IVF_FLAT"),
            IndexType::Hnsw => write!(f, "HNSW"),
        }
    }
}

impl std::str::FromStr for IndexType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "AUTOINDEX" | "AUTO" => Ok(IndexType::AutoIndex),
            "IVF_FLAT" => Ok(IndexType::IvfFlat),
            "HNSW" => Ok(IndexType::Hnsw),
            _ => Err(format!("unknown index type: {}", s)),
        }
    }
}

/// Parameters for creating a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub dimension: u32,
    pub metric_type: MetricType,
    pub index_type: IndexType,
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self {
            dimension: 1536,
            metric_type: MetricType::Cosine,
            index_type: IndexType::AutoIndex,
        }
    }
}

/// Check a collection name: a leading letter, then letters, digits or underscores.
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidValue(format!(
            "collection name '{}' must start with a letter and contain only letters, numbers, and underscores",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_type_parse_and_display() {
        assert_eq!("cosine".parse::<MetricType>().unwrap(), MetricType::Cosine);
        assert_eq!("ip".parse::<MetricType>().unwrap(), MetricType::Ip);
        assert_eq!(MetricType::L2.to_string(), "L2");
        assert!("manhattan".parse::<MetricType>().is_err());
    }

    #[test]
    fn test_index_type_serde_names() {
        let json = serde_json::to_string(&IndexType::IvfFlat).unwrap();
        assert_eq!(json, "\"IVF_FLAT\"");
        assert_eq!("ivf-flat".parse::<IndexType>().unwrap(), IndexType::IvfFlat);
    }

    #[test]
    fn test_validate_collection_name() {
        assert!(validate_collection_name("knowledge_base_1").is_ok());
        assert!(validate_collection_name("Docs").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("1docs").is_err());
        assert!(validate_collection_name("my-docs").is_err());
        assert!(validate_collection_name("_docs").is_err());
    }
}
