use crate::ModelError;
use std::fmt;
use std::str::FromStr;

/// Strategy determining how two embeddings are compared and how training loss is computed
///
/// # Variants
///
/// - `Classification` - Single-output linear head over `left ⊙ right`, scored as the pair `(-h, h)`, cross-entropy loss
/// - `Classification2` - Two-output linear head over `left ⊙ right` with class 0 pinned to its bias, cross-entropy loss
/// - `Cosine` - Cosine similarity of the embeddings, pairwise hinge loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Classification,
    Classification2,
    Cosine,
}

impl Criterion {
    /// All supported criteria
    pub const ALL: [Criterion; 3] = [
        Criterion::Classification,
        Criterion::Classification2,
        Criterion::Cosine,
    ];

    /// The configuration string selecting this criterion
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Classification => "classification",
            Criterion::Classification2 => "classification2",
            Criterion::Cosine => "cosine",
        }
    }

    /// Whether the criterion produces two-class scores (and is trained with cross-entropy)
    pub fn is_classification(&self) -> bool {
        !matches!(self, Criterion::Cosine)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ModelError;

    /// Parses a criterion name. Matching is exact: `"Cosine"` is not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ModelError::UnrecognizedConfig(format!("Unknown criterion: {}", s)))
    }
}
