//! Rarity scoring and grading
//!
//! A draw's score is the sum of the score factors of its four parts. The
//! score is bucketed into a [`Grade`] by walking a threshold table from the
//! highest cut point down; the first threshold the score reaches wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{Catalogs, Layer};
use crate::generator::Draw;

/// Discrete rarity label, ordered from most common (`N`) to rarest (`SSSS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Grade {
    N,
    C,
    B,
    A,
    S,
    SS,
    SSS,
    SSSS,
}

impl Grade {
    /// All grades, rarest first.
    pub const ALL: [Grade; 8] = [
        Grade::SSSS,
        Grade::SSS,
        Grade::SS,
        Grade::S,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::N,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::SSSS => "SSSS",
            Grade::SSS => "SSS",
            Grade::SS => "SS",
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::N => "N",
        }
    }

    /// `S` and above.
    pub fn is_rare(self) -> bool {
        self >= Grade::S
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = RarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Grade::ALL
            .into_iter()
            .find(|g| g.label() == upper)
            .ok_or_else(|| RarityError::UnknownGrade(s.to_string()))
    }
}

/// Error type for building a threshold table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RarityError {
    #[error("unknown grade '{0}'")]
    UnknownGrade(String),
    #[error("grade N is the fallback and cannot have a threshold")]
    FallbackThreshold,
    #[error("threshold for {0} is not a finite number")]
    NotFinite(Grade),
    #[error("threshold for {lower} ({lower_min}) must be below the threshold for {higher} ({higher_min})")]
    NotDecreasing {
        higher: Grade,
        higher_min: f64,
        lower: Grade,
        lower_min: f64,
    },
    #[error("missing threshold for {0}")]
    Missing(Grade),
    #[error("duplicate threshold for {0}")]
    Duplicate(Grade),
}

/// Ordered `(minimum score, grade)` cut points, evaluated top-down.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    thresholds: Vec<(f64, Grade)>,
}

impl GradeTable {
    /// Build a table from cut points listed rarest first.
    ///
    /// Every grade above `N` must appear exactly once, in rarity order,
    /// with strictly decreasing finite minimums.
    pub fn new(thresholds: Vec<(f64, Grade)>) -> Result<Self, RarityError> {
        if thresholds.iter().any(|&(_, g)| g == Grade::N) {
            return Err(RarityError::FallbackThreshold);
        }
        let expected = &Grade::ALL[..Grade::ALL.len() - 1];
        for (i, &grade) in expected.iter().enumerate() {
            match thresholds.get(i) {
                Some(&(min, g)) if g == grade => {
                    if !min.is_finite() {
                        return Err(RarityError::NotFinite(grade));
                    }
                }
                _ => return Err(RarityError::Missing(grade)),
            }
        }
        if let Some(&(_, extra)) = thresholds.get(expected.len()) {
            return Err(RarityError::Duplicate(extra));
        }
        for pair in thresholds.windows(2) {
            let (higher_min, higher) = pair[0];
            let (lower_min, lower) = pair[1];
            if lower_min >= higher_min {
                return Err(RarityError::NotDecreasing {
                    higher,
                    higher_min,
                    lower,
                    lower_min,
                });
            }
        }
        Ok(Self { thresholds })
    }

    /// Build a table from a grade → minimum map (the config file shape).
    pub fn from_map(map: &BTreeMap<Grade, f64>) -> Result<Self, RarityError> {
        if map.contains_key(&Grade::N) {
            return Err(RarityError::FallbackThreshold);
        }
        let mut thresholds = Vec::with_capacity(map.len());
        for grade in &Grade::ALL[..Grade::ALL.len() - 1] {
            let min = map.get(grade).ok_or(RarityError::Missing(*grade))?;
            thresholds.push((*min, *grade));
        }
        Self::new(thresholds)
    }

    /// Grade for `score`; `N` when no threshold is reached.
    ///
    /// A score equal to a threshold qualifies for that grade.
    pub fn grade(&self, score: f64) -> Grade {
        self.thresholds
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|&(_, grade)| grade)
            .unwrap_or(Grade::N)
    }

    /// Minimum score for `grade` (`None` for the fallback grade).
    pub fn minimum(&self, grade: Grade) -> Option<f64> {
        self.thresholds.iter().find(|(_, g)| *g == grade).map(|&(min, _)| min)
    }

    /// Cut points rarest first.
    pub fn thresholds(&self) -> &[(f64, Grade)] {
        &self.thresholds
    }

    /// Grade → minimum map, the inverse of [`GradeTable::from_map`].
    pub fn to_map(&self) -> BTreeMap<Grade, f64> {
        self.thresholds.iter().map(|&(min, g)| (g, min)).collect()
    }
}

impl Default for GradeTable {
    /// The canonical table: SSSS 16, SSS 13, SS 10, S 7, A 5, B 4, C 3.
    fn default() -> Self {
        Self {
            thresholds: vec![
                (16.0, Grade::SSSS),
                (13.0, Grade::SSS),
                (10.0, Grade::SS),
                (7.0, Grade::S),
                (5.0, Grade::A),
                (4.0, Grade::B),
                (3.0, Grade::C),
            ],
        }
    }
}

/// Rarity score of `draw`: the sum of each part's score factor.
///
/// Out-of-range indices and non-finite factors contribute 1.0.
pub fn score(catalogs: &Catalogs, draw: &Draw) -> f64 {
    Layer::ALL
        .iter()
        .map(|&layer| catalogs[layer].score_factor(draw.index(layer)))
        .sum()
}

/// Score and grade of a draw under a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rarity {
    pub score: f64,
    pub grade: Grade,
}

impl Rarity {
    pub fn assess(catalogs: &Catalogs, table: &GradeTable, draw: &Draw) -> Self {
        let score = score(catalogs, draw);
        Self {
            score,
            grade: table.grade(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PartCatalog, PartEntry};

    fn draw(skin: usize, face: usize, face2: usize, hair: usize) -> Draw {
        Draw {
            skin,
            face,
            face2,
            hair,
            hair_hue: 0,
        }
    }

    fn catalog(layer: Layer, factors: &[f64]) -> PartCatalog {
        PartCatalog::new(
            layer,
            factors
                .iter()
                .enumerate()
                .map(|(i, &f)| PartEntry {
                    key: format!("{:03}", i),
                    possibility: 1.0,
                    score_factor: f,
                })
                .collect(),
        )
    }

    #[test]
    fn test_default_catalog_scores_four() {
        let catalogs = Catalogs::fallback();
        assert_eq!(score(&catalogs, &draw(0, 3, 11, 25)), 4.0);
    }

    #[test]
    fn test_score_sums_factors() {
        let catalogs = Catalogs::new(
            catalog(Layer::Skin, &[1.0, 2.0]),
            catalog(Layer::Face, &[0.5, 3.5]),
            catalog(Layer::Face2, &[1.25]),
            catalog(Layer::Hair, &[1.0, 1.0, 6.0]),
        );
        assert_eq!(score(&catalogs, &draw(1, 1, 0, 2)), 2.0 + 3.5 + 1.25 + 6.0);
    }

    #[test]
    fn test_out_of_range_index_scores_one() {
        let catalogs = Catalogs::new(
            catalog(Layer::Skin, &[5.0]),
            catalog(Layer::Face, &[5.0]),
            catalog(Layer::Face2, &[5.0]),
            catalog(Layer::Hair, &[5.0]),
        );
        assert_eq!(score(&catalogs, &draw(7, 0, 0, 0)), 16.0);
    }

    #[test]
    fn test_grade_boundaries() {
        let table = GradeTable::default();
        assert_eq!(table.grade(16.0), Grade::SSSS);
        assert_eq!(table.grade(15.99), Grade::SSS);
        assert_eq!(table.grade(13.0), Grade::SSS);
        assert_eq!(table.grade(10.0), Grade::SS);
        assert_eq!(table.grade(7.0), Grade::S);
        assert_eq!(table.grade(5.0), Grade::A);
        assert_eq!(table.grade(4.0), Grade::B);
        assert_eq!(table.grade(3.0), Grade::C);
        assert_eq!(table.grade(2.9), Grade::N);
        assert_eq!(table.grade(f64::NAN), Grade::N);
    }

    #[test]
    fn test_grade_is_monotonic() {
        let table = GradeTable::default();
        let mut last = Grade::N;
        for step in 0..=400 {
            let g = table.grade(step as f64 * 0.05);
            assert!(g >= last, "grade dropped at {}", step);
            last = g;
        }
        assert_eq!(last, Grade::SSSS);
    }

    #[test]
    fn test_grade_parse_and_display() {
        for g in Grade::ALL {
            assert_eq!(g.to_string().parse::<Grade>().unwrap(), g);
        }
        assert_eq!("sss".parse::<Grade>().unwrap(), Grade::SSS);
        assert!("X".parse::<Grade>().is_err());
    }

    #[test]
    fn test_is_rare() {
        assert!(Grade::S.is_rare());
        assert!(Grade::SSSS.is_rare());
        assert!(!Grade::A.is_rare());
        assert!(!Grade::N.is_rare());
    }

    #[test]
    fn test_table_rejects_non_decreasing() {
        let mut map = GradeTable::default().to_map();
        map.insert(Grade::A, 7.0);
        assert!(matches!(GradeTable::from_map(&map), Err(RarityError::NotDecreasing { .. })));
    }

    #[test]
    fn test_table_rejects_missing_and_fallback() {
        let mut map = GradeTable::default().to_map();
        map.remove(&Grade::C);
        assert_eq!(GradeTable::from_map(&map), Err(RarityError::Missing(Grade::C)));

        let mut map = GradeTable::default().to_map();
        map.insert(Grade::N, 0.0);
        assert_eq!(GradeTable::from_map(&map), Err(RarityError::FallbackThreshold));
    }

    #[test]
    fn test_table_rejects_duplicate_grade() {
        let mut thresholds = GradeTable::default().thresholds().to_vec();
        thresholds.push((1.0, Grade::C));
        assert_eq!(GradeTable::new(thresholds), Err(RarityError::Duplicate(Grade::C)));
    }

    #[test]
    fn test_table_rejects_non_finite() {
        let mut map = GradeTable::default().to_map();
        map.insert(Grade::SSSS, f64::INFINITY);
        assert_eq!(GradeTable::from_map(&map), Err(RarityError::NotFinite(Grade::SSSS)));
    }

    #[test]
    fn test_custom_table_from_map() {
        let map = BTreeMap::from([
            (Grade::SSSS, 13.0),
            (Grade::SSS, 11.0),
            (Grade::SS, 9.5),
            (Grade::S, 8.0),
            (Grade::A, 5.5),
            (Grade::B, 3.5),
            (Grade::C, 1.0),
        ]);
        let table = GradeTable::from_map(&map).unwrap();
        assert_eq!(table.grade(4.0), Grade::B);
        assert_eq!(table.grade(0.5), Grade::N);
        assert_eq!(table.minimum(Grade::S), Some(8.0));
        assert_eq!(table.minimum(Grade::N), None);
    }

    #[test]
    fn test_assess_default_catalog_is_b() {
        let rarity = Rarity::assess(&Catalogs::fallback(), &GradeTable::default(), &draw(0, 0, 0, 0));
        assert_eq!(rarity.score, 4.0);
        assert_eq!(rarity.grade, Grade::B);
    }
}
