//! Visit records and the validated input form used to create them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{DakaError, Result};

/// Date format used for every stored `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// One logged restaurant check-in.
///
/// `date` is kept as the raw `YYYY-MM-DD` string. Range filters compare it
/// lexicographically, which is only sound because the format is fixed-width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub date: String,
    pub score: f64,
    #[serde(default)]
    pub comment: String,
    pub image_path: Option<String>,
}

impl VisitRecord {
    pub fn has_image(&self) -> bool {
        self.image_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// A check-in as entered by the user, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVisit {
    pub name: String,
    pub category: String,
    pub date: String,
    pub score: f64,
    pub comment: String,
    pub image_path: Option<String>,
}

impl NewVisit {
    pub fn new(name: &str, category: &str, date: &str, score: f64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            date: date.to_string(),
            score,
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn with_image(mut self, image_path: &str) -> Self {
        self.image_path = Some(image_path.to_string());
        self
    }

    /// Trims the text fields and rejects input the store must never hold.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or type, a date that is not a real
    /// `YYYY-MM-DD` calendar date, or a score outside `0.0..=10.0`.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DakaError::EmptyName);
        }

        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(DakaError::EmptyCategory);
        }

        let date = self.date.trim().to_string();
        // chrono accepts "2023-1-5" for %Y-%m-%d; the stored form must be zero-padded.
        if date.len() != 10 || NaiveDate::parse_from_str(&date, DATE_FORMAT).is_err() {
            return Err(DakaError::InvalidDate(date));
        }

        if !self.score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(DakaError::ScoreOutOfRange(self.score));
        }

        let image_path = self
            .image_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            name,
            category,
            date,
            score: self.score,
            comment: self.comment.trim().to_string(),
            image_path,
        })
    }

    pub(crate) fn into_record(self, id: u64) -> VisitRecord {
        VisitRecord {
            id,
            name: self.name,
            category: self.category,
            date: self.date,
            score: self.score,
            comment: self.comment,
            image_path: self.image_path,
        }
    }
}

/// Parses a user-entered score such as `"8.5"`.
pub fn parse_score(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DakaError::InvalidScore(raw.to_string()))
}

/// Today's date in the stored format, used as the default visit date.
pub fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_fields() {
        let visit = NewVisit::new("  海底捞 ", " 火锅", " 2023-10-01 ", 9.5)
            .with_comment(" 服务很好 ")
            .validate()
            .unwrap();

        assert_eq!(visit.name, "海底捞");
        assert_eq!(visit.category, "火锅");
        assert_eq!(visit.date, "2023-10-01");
        assert_eq!(visit.comment, "服务很好");
        assert_eq!(visit.image_path, None);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let err = NewVisit::new("   ", "火锅", "2023-10-01", 9.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, DakaError::EmptyName));
    }

    #[test]
    fn test_validate_rejects_empty_category() {
        let err = NewVisit::new("A", "", "2023-10-01", 9.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, DakaError::EmptyCategory));
    }

    #[test]
    fn test_validate_rejects_bad_dates() {
        for date in ["2023/10/01", "2023-13-01", "2023-1-5", "yesterday", ""] {
            let err = NewVisit::new("A", "川菜", date, 8.0)
                .validate()
                .unwrap_err();
            assert!(matches!(err, DakaError::InvalidDate(_)), "accepted {date}");
        }
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(NewVisit::new("A", "川菜", "2023-10-01", 0.0).validate().is_ok());
        assert!(NewVisit::new("A", "川菜", "2023-10-01", 10.0).validate().is_ok());

        for score in [-0.1, 10.1, f64::NAN, f64::INFINITY] {
            let err = NewVisit::new("A", "川菜", "2023-10-01", score)
                .validate()
                .unwrap_err();
            assert!(matches!(err, DakaError::ScoreOutOfRange(_)));
        }
    }

    #[test]
    fn test_blank_image_path_becomes_none() {
        let visit = NewVisit::new("A", "川菜", "2023-10-01", 8.0)
            .with_image("  ")
            .validate()
            .unwrap();
        assert_eq!(visit.image_path, None);
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score(" 8.5 ").unwrap(), 8.5);
        assert!(matches!(parse_score("eight"), Err(DakaError::InvalidScore(_))));
    }

    #[test]
    fn test_today_is_valid_date() {
        let date = today();
        assert!(NewVisit::new("A", "川菜", &date, 8.0).validate().is_ok());
    }
}
