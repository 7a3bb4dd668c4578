//! Placement lanes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AdsError;

/// The wildcard category.
pub const ALL_CATEGORIES: &str = "all";

const WEEKLY_KEY: &str = "most_popular";
const ALL_KEY: &str = "pinned_ad_all";
const CUISINE_PREFIX: &str = "pinned_ad_cuisine_";

/// The delivery lane a campaign competes in.
///
/// Stored as `most_popular`, `pinned_ad_all` or `pinned_ad_cuisine_<name>`;
/// the string form only exists at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Placement {
    /// Pinned slot on every category, including "all".
    All,
    /// Pinned slot on one cuisine only.
    Cuisine(String),
    /// The weekly "most popular" slot, surfaced separately from the pinned card.
    Weekly,
}

impl Placement {
    /// Create a cuisine placement.
    pub fn cuisine(name: impl Into<String>) -> Self {
        Placement::Cuisine(name.into())
    }

    /// Whether this is the cuisine lane for `category`.
    pub fn targets(&self, category: &str) -> bool {
        matches!(self, Placement::Cuisine(name) if name == category)
    }

    /// Lanes requested for a category.
    ///
    /// `"all"` asks for the weekly and general pinned lanes; any other category
    /// additionally asks for its own cuisine lane.
    pub fn lanes_for(category: &str) -> Vec<Placement> {
        let mut lanes = vec![Placement::Weekly, Placement::All];
        if category != ALL_CATEGORIES {
            lanes.push(Placement::cuisine(category));
        }
        lanes
    }

    /// Storage key for this lane.
    pub fn key(&self) -> String {
        match self {
            Placement::All => ALL_KEY.to_string(),
            Placement::Weekly => WEEKLY_KEY.to_string(),
            Placement::Cuisine(name) => format!("{}{}", CUISINE_PREFIX, name),
        }
    }
}

impl FromStr for Placement {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ALL_KEY => Ok(Placement::All),
            WEEKLY_KEY => Ok(Placement::Weekly),
            _ => match s.strip_prefix(CUISINE_PREFIX) {
                Some(name) if !name.is_empty() => Ok(Placement::cuisine(name)),
                _ => Err(AdsError::InvalidPlacement(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Placement {
    type Error = AdsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Placement> for String {
    fn from(p: Placement) -> Self {
        p.key()
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!("pinned_ad_all".parse::<Placement>().unwrap(), Placement::All);
        assert_eq!("most_popular".parse::<Placement>().unwrap(), Placement::Weekly);
        assert_eq!(
            "pinned_ad_cuisine_sushi".parse::<Placement>().unwrap(),
            Placement::cuisine("sushi")
        );
    }

    #[test]
    fn test_reject_malformed_keys() {
        assert!("pinned_ad_cuisine_".parse::<Placement>().is_err());
        assert!("pinned_ad_al".parse::<Placement>().is_err());
        assert!("".parse::<Placement>().is_err());
    }

    #[test]
    fn test_key_round_trip_through_serde() {
        let p = Placement::cuisine("thai");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#""pinned_ad_cuisine_thai""#);
        assert_eq!(serde_json::from_str::<Placement>(&json).unwrap(), p);
    }

    #[test]
    fn test_lanes_for_category() {
        assert_eq!(
            Placement::lanes_for("all"),
            vec![Placement::Weekly, Placement::All]
        );
        assert_eq!(
            Placement::lanes_for("sushi"),
            vec![Placement::Weekly, Placement::All, Placement::cuisine("sushi")]
        );
    }

    #[test]
    fn test_targets() {
        assert!(Placement::cuisine("sushi").targets("sushi"));
        assert!(!Placement::cuisine("sushi").targets("ramen"));
        assert!(!Placement::All.targets("sushi"));
    }
}
