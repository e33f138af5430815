// Risk level value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    LOW,
    MEDIUM,
    HIGH,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::LOW => "LOW",
            RiskLevel::MEDIUM => "MEDIUM",
            RiskLevel::HIGH => "HIGH",
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LOW" => RiskLevel::LOW,
            "HIGH" => RiskLevel::HIGH,
            _ => RiskLevel::MEDIUM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_severity() {
        assert!(RiskLevel::LOW < RiskLevel::MEDIUM);
        assert!(RiskLevel::MEDIUM < RiskLevel::HIGH);
        assert_eq!(RiskLevel::from("high"), RiskLevel::HIGH);
        assert_eq!(RiskLevel::from("whatever"), RiskLevel::MEDIUM);
    }
}
