use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Two labeled options shown side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pairing {
    pub id: i64,
    pub left_label: String,
    pub right_label: String,
    pub left_img_url: String,
    pub right_img_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPairing {
    pub left_label: String,
    pub right_label: String,
    pub left_img_url: String,
    pub right_img_url: String,
}

impl NewPairing {
    pub fn new(
        left_label: &str,
        right_label: &str,
        left_img_url: &str,
        right_img_url: &str,
    ) -> Self {
        Self {
            left_label: left_label.to_string(),
            right_label: right_label.to_string(),
            left_img_url: left_img_url.to_string(),
            right_img_url: right_img_url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(Error::InvalidArgument(format!(
                "side must be \"left\" or \"right\", got {:?}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub pairing_id: i64,
    pub visitor_key: String,
    pub side: Side,
    pub created_at: DateTime<Utc>,
}

/// Left/right totals for one pairing, always computed from the vote rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub left_votes: i64,
    pub right_votes: i64,
}

impl VoteCounts {
    pub fn new(left_votes: i64, right_votes: i64) -> Self {
        Self { left_votes, right_votes }
    }

    pub fn total(&self) -> i64 {
        self.left_votes + self.right_votes
    }

    /// Rounded share of each side. Not normalized, so the pair may add up
    /// to 99 or 101.
    pub fn percentages(&self) -> (u32, u32) {
        let total = self.total();
        if total <= 0 {
            return (0, 0);
        }
        (percent_of(self.left_votes, total), percent_of(self.right_votes, total))
    }
}

fn percent_of(part: i64, total: i64) -> u32 {
    (part as f64 / total as f64 * 100.0).round() as u32
}
