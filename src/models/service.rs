use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceName {
    Plumbing,
    Electrical,
    Masonry,
    #[serde(rename = "Carpentry Works")]
    CarpentryWorks,
    Others,
}

impl ServiceName {
    pub const ALL: [ServiceName; 5] = [
        ServiceName::Plumbing,
        ServiceName::Electrical,
        ServiceName::Masonry,
        ServiceName::CarpentryWorks,
        ServiceName::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Plumbing => "Plumbing",
            ServiceName::Electrical => "Electrical",
            ServiceName::Masonry => "Masonry",
            ServiceName::CarpentryWorks => "Carpentry Works",
            ServiceName::Others => "Others",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|name| name.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub service_name: ServiceName,
    pub hourly_rate: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub service_name: Option<String>,
    pub hourly_rate: Option<f64>,
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(ServiceName::parse("Plumbing"), Some(ServiceName::Plumbing));
        assert_eq!(
            ServiceName::parse(" Carpentry Works "),
            Some(ServiceName::CarpentryWorks)
        );
        assert_eq!(ServiceName::parse("plumbing"), None);
        assert_eq!(ServiceName::parse("Gardening"), None);
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&ServiceName::CarpentryWorks).unwrap();
        assert_eq!(json, r#""Carpentry Works""#);
        for name in ServiceName::ALL {
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, name.as_str());
        }
    }
}
