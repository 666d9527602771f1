use serde::{Deserialize, Serialize};

/// One entry of a threshold table. Scores strictly below `below` take this
/// label; the final entry has no bound and catches everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    pub label: String,
}

impl Band {
    fn bounded(below: f64, label: &str) -> Self {
        Self {
            below: Some(below),
            label: label.to_string(),
        }
    }

    fn open(label: &str) -> Self {
        Self {
            below: None,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BandTableError {
    #[error("band table must contain at least one band")]
    Empty,
    #[error("band '{label}' must be the last entry because it has no upper bound")]
    UnboundedBeforeEnd { label: String },
    #[error("band table must end with an entry without an upper bound")]
    MissingCatchAll,
    #[error("band bounds must be strictly ascending ('{label}' at {below})")]
    NotAscending { label: String, below: f64 },
}

/// Ordered half-open thresholds evaluated from the lowest bound upwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Band>", into = "Vec<Band>")]
pub struct BandTable {
    bands: Vec<Band>,
}

impl BandTable {
    /// Raw 0–4 component scale.
    pub fn component() -> Self {
        Self {
            bands: vec![
                Band::bounded(1.0, "Low"),
                Band::bounded(2.0, "Moderate"),
                Band::bounded(3.0, "High"),
                Band::open("Extreme"),
            ],
        }
    }

    /// 0–100 scale for module-derived indices.
    pub fn module() -> Self {
        Self {
            bands: vec![
                Band::bounded(25.0, "Low"),
                Band::bounded(50.0, "Moderate"),
                Band::bounded(75.0, "High"),
                Band::open("Extreme"),
            ],
        }
    }

    /// 0–100 scale for the constitutional indices and the global score.
    pub fn constitutional() -> Self {
        Self {
            bands: vec![
                Band::bounded(20.0, "Green"),
                Band::bounded(40.0, "Yellow"),
                Band::bounded(60.0, "Amber"),
                Band::bounded(80.0, "Red"),
                Band::open("Black"),
            ],
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Label for `score`; the bound itself belongs to the next band.
    pub fn band(&self, score: Option<f64>) -> Option<&str> {
        let score = score?;
        self.bands
            .iter()
            .find(|band| band.below.map_or(true, |below| score < below))
            .map(|band| band.label.as_str())
    }
}

impl TryFrom<Vec<Band>> for BandTable {
    type Error = BandTableError;

    fn try_from(bands: Vec<Band>) -> Result<Self, Self::Error> {
        let Some((last, bounded)) = bands.split_last() else {
            return Err(BandTableError::Empty);
        };

        if last.below.is_some() {
            return Err(BandTableError::MissingCatchAll);
        }

        let mut previous: Option<f64> = None;
        for band in bounded {
            let Some(below) = band.below else {
                return Err(BandTableError::UnboundedBeforeEnd {
                    label: band.label.clone(),
                });
            };
            if previous.is_some_and(|prev| below <= prev) || !below.is_finite() {
                return Err(BandTableError::NotAscending {
                    label: band.label.clone(),
                    below,
                });
            }
            previous = Some(below);
        }

        Ok(Self { bands })
    }
}

impl From<BandTable> for Vec<Band> {
    fn from(table: BandTable) -> Self {
        table.bands
    }
}
