use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum School {
    #[serde(rename = "Shafi'i")]
    Shafii,
    Hanafi,
    Maliki,
    Hanbali,
    Other,
}

impl School {
    pub fn as_str(&self) -> &'static str {
        match self {
            School::Shafii => "Shafi'i",
            School::Hanafi => "Hanafi",
            School::Maliki => "Maliki",
            School::Hanbali => "Hanbali",
            School::Other => "Other",
        }
    }
}

impl std::fmt::Display for School {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for School {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shafi'i" | "shafii" | "shafi" => Ok(School::Shafii),
            "hanafi" => Ok(School::Hanafi),
            "maliki" => Ok(School::Maliki),
            "hanbali" => Ok(School::Hanbali),
            "other" => Ok(School::Other),
            _ => Err(anyhow::anyhow!("Unknown school: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mosque {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub school: School,
    pub facilities: Vec<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    /// New registrations stay hidden from the public directory until approved.
    pub approved: bool,
    /// Kilometres from the searcher; only set by nearby queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Mosque {
    pub fn location_line(&self) -> String {
        [self.address.as_str(), self.city.as_str(), self.state.as_str(), self.country.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}
