//! Meeting record model
//!
//! A [`Record`] is one historical sales meeting as returned by the record
//! store. Categorical attributes are addressed through [`Dimension`], which
//! maps each supported attribute to a typed extractor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One historical deal/meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub seller: Option<String>,
    pub industry: Option<String>,
    pub sentiment: Option<String>,
    pub urgency: Option<String>,
    pub discovery_source: Option<String>,
    pub operation_size: Option<String>,
    /// Number of interactions logged during the meeting
    pub interaction_volume: Option<f64>,
    /// Deal closed after this meeting
    pub closed: bool,
    pub meeting_date: NaiveDate,
    /// Record went through the categorization pass
    pub processed: bool,
}

impl Record {
    /// Processed, unclosed record with no dimensions set
    pub fn new(id: i64, meeting_date: NaiveDate) -> Self {
        Self {
            id,
            seller: None,
            industry: None,
            sentiment: None,
            urgency: None,
            discovery_source: None,
            operation_size: None,
            interaction_volume: None,
            closed: false,
            meeting_date,
            processed: true,
        }
    }

    /// Value of `dimension`, with blank strings treated as missing
    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::Seller => self.seller.as_deref(),
            Dimension::Industry => self.industry.as_deref(),
            Dimension::Sentiment => self.sentiment.as_deref(),
            Dimension::Urgency => self.urgency.as_deref(),
            Dimension::DiscoverySource => self.discovery_source.as_deref(),
            Dimension::OperationSize => self.operation_size.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match dimension {
            Dimension::Seller => self.seller = value,
            Dimension::Industry => self.industry = value,
            Dimension::Sentiment => self.sentiment = value,
            Dimension::Urgency => self.urgency = value,
            Dimension::DiscoverySource => self.discovery_source = value,
            Dimension::OperationSize => self.operation_size = value,
        }
        self
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn with_interaction_volume(mut self, volume: f64) -> Self {
        self.interaction_volume = Some(volume);
        self
    }

    pub fn with_processed(mut self, processed: bool) -> Self {
        self.processed = processed;
        self
    }
}

/// Categorical attribute of a record usable as a grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Seller,
    Industry,
    Sentiment,
    Urgency,
    DiscoverySource,
    OperationSize,
}

impl Dimension {
    /// Every supported dimension, in reporting order
    pub const ALL: [Dimension; 6] = [
        Dimension::Seller,
        Dimension::Industry,
        Dimension::Sentiment,
        Dimension::Urgency,
        Dimension::DiscoverySource,
        Dimension::OperationSize,
    ];

    /// Dimensions cross-tabulated against each seller
    pub const CORRELATED: [Dimension; 5] = [
        Dimension::Industry,
        Dimension::OperationSize,
        Dimension::Urgency,
        Dimension::Sentiment,
        Dimension::DiscoverySource,
    ];

    /// Column / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Seller => "seller",
            Dimension::Industry => "industry",
            Dimension::Sentiment => "sentiment",
            Dimension::Urgency => "urgency",
            Dimension::DiscoverySource => "discoverySource",
            Dimension::OperationSize => "operationSize",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "seller" => Ok(Dimension::Seller),
            "industry" => Ok(Dimension::Industry),
            "sentiment" => Ok(Dimension::Sentiment),
            "urgency" => Ok(Dimension::Urgency),
            "discoverySource" | "discovery_source" => Ok(Dimension::DiscoverySource),
            "operationSize" | "operation_size" => Ok(Dimension::OperationSize),
            other => Err(crate::Error::InvalidInput(format!("Unknown dimension: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(1, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_dimension_extraction() {
        let record = sample()
            .with_dimension(Dimension::Industry, "Tech")
            .with_dimension(Dimension::Seller, "Ana");
        assert_eq!(record.dimension(Dimension::Industry), Some("Tech"));
        assert_eq!(record.dimension(Dimension::Seller), Some("Ana"));
        assert_eq!(record.dimension(Dimension::Urgency), None);
    }

    #[test]
    fn test_blank_dimension_is_missing() {
        let record = sample().with_dimension(Dimension::Sentiment, "   ");
        assert_eq!(record.dimension(Dimension::Sentiment), None);
    }

    #[test]
    fn test_dimension_name_roundtrip() {
        for dimension in Dimension::ALL {
            assert_eq!(dimension.as_str().parse::<Dimension>().unwrap(), dimension);
        }
        assert!("region".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_correlated_excludes_seller() {
        assert!(!Dimension::CORRELATED.contains(&Dimension::Seller));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = sample().with_dimension(Dimension::DiscoverySource, "Referral");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["discoverySource"], "Referral");
        assert_eq!(json["meetingDate"], "2024-03-01");
    }
}
