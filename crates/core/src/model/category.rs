use std::collections::HashSet;

use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::CategoryKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category key cannot be empty")]
    EmptyKey,

    #[error("category {key} has no answer options")]
    EmptyScale { key: CategoryKey },

    #[error("category {key} lists answer option {value} twice")]
    DuplicateValue { key: CategoryKey, value: AnswerValue },

    #[error("category {key} answer option {value} is not a numeric score")]
    NonNumericValue { key: CategoryKey, value: AnswerValue },

    #[error("catalog must contain at least one category")]
    EmptyCatalog,

    #[error("catalog lists category {key} twice")]
    DuplicateKey { key: CategoryKey },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// One selectable answer: the stored token plus the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleOption {
    value: AnswerValue,
    label: String,
}

impl ScaleOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: AnswerValue::new(value),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &AnswerValue {
        &self.value
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Immutable descriptor of a questionnaire section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    key: CategoryKey,
    name: String,
    subtitle: Option<String>,
    description: String,
    instructions: Vec<String>,
    scale: Vec<ScaleOption>,
}

impl Category {
    /// Creates a category with its ordered answer scale.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError` if the key is blank, the scale is empty, a token
    /// repeats, or a token does not carry a numeric score.
    pub fn new(
        key: CategoryKey,
        name: impl Into<String>,
        scale: Vec<ScaleOption>,
    ) -> Result<Self, CategoryError> {
        if key.as_str().trim().is_empty() {
            return Err(CategoryError::EmptyKey);
        }
        if scale.is_empty() {
            return Err(CategoryError::EmptyScale { key });
        }

        let mut seen = HashSet::with_capacity(scale.len());
        for option in &scale {
            if option.value.score().is_none() {
                return Err(CategoryError::NonNumericValue {
                    key,
                    value: option.value.clone(),
                });
            }
            if !seen.insert(option.value.as_str()) {
                return Err(CategoryError::DuplicateValue {
                    key,
                    value: option.value.clone(),
                });
            }
        }

        Ok(Self {
            key,
            name: name.into(),
            subtitle: None,
            description: String::new(),
            instructions: Vec::new(),
            scale,
        })
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_instructions<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = lines.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn key(&self) -> &CategoryKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    #[must_use]
    pub fn scale(&self) -> &[ScaleOption] {
        &self.scale
    }

    /// Permitted answer tokens in display order.
    pub fn allowed_values(&self) -> impl Iterator<Item = &AnswerValue> {
        self.scale.iter().map(ScaleOption::value)
    }

    #[must_use]
    pub fn allows(&self, value: &AnswerValue) -> bool {
        self.allowed_values().any(|allowed| allowed == value)
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Fixed, ordered set of categories. A category's index is its display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyCatalog` or `CategoryError::DuplicateKey`.
    pub fn new(categories: Vec<Category>) -> Result<Self, CategoryError> {
        if categories.is_empty() {
            return Err(CategoryError::EmptyCatalog);
        }
        let mut seen = HashSet::with_capacity(categories.len());
        for category in &categories {
            if !seen.insert(category.key()) {
                return Err(CategoryError::DuplicateKey {
                    key: category.key().clone(),
                });
            }
        }
        Ok(Self { categories })
    }

    /// The three standard assessments.
    #[must_use]
    pub fn standard() -> Self {
        let agreement = || {
            vec![
                ScaleOption::new("1", "1 Mostly Disagree"),
                ScaleOption::new("2", "2 Slightly Disagree"),
                ScaleOption::new("3", "3 Slightly Agree"),
                ScaleOption::new("4", "4 Mostly Agree"),
            ]
        };
        let agreement_legend = [
            "Score the statements:",
            "1 - Mostly Disagree",
            "2 - Slightly Disagree",
            "3 - Slightly Agree",
            "4 - Mostly Agree",
        ];

        let categories = vec![
            Category {
                key: CategoryKey::new("HowGard"),
                name: "Multiple Intelligences Test".into(),
                subtitle: Some("based on Howard Gardner's MI Model".into()),
                description: "Discover your unique intelligence profile across 8 different \
                              types of intelligence. This assessment will help identify your \
                              cognitive strengths and preferred learning styles."
                    .into(),
                instructions: std::iter::once("Rate all the questions below with a score of 1-4.")
                    .chain(agreement_legend)
                    .map(String::from)
                    .collect(),
                scale: agreement(),
            },
            Category {
                key: CategoryKey::new("Attitude"),
                name: "Attitude Styles Checklist".into(),
                subtitle: None,
                description: "Understand your behavioral patterns and attitude tendencies. This \
                              assessment reveals how you approach situations and interact with \
                              the world around you."
                    .into(),
                instructions: agreement_legend.iter().map(|s| (*s).to_string()).collect(),
                scale: agreement(),
            },
            Category {
                key: CategoryKey::new("Motivational"),
                name: "Your Motivational Profile".into(),
                subtitle: None,
                description: "Explore what drives and motivates you in work and life. This \
                              assessment helps identify your key motivational factors and work \
                              preferences."
                    .into(),
                instructions: vec![
                    "For each of the following statements, choose the number that most \
                     closely agrees with how you feel."
                        .into(),
                    "Consider your answers in the context of your current job or past work \
                     experience."
                        .into(),
                ],
                scale: vec![
                    ScaleOption::new("1", "Strongly Disagree"),
                    ScaleOption::new("2", "Disagree"),
                    ScaleOption::new("3", "Moderate"),
                    ScaleOption::new("4", "Agree"),
                    ScaleOption::new("5", "Strongly Agree"),
                ],
            },
        ];

        Self { categories }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    /// Display order of the category with `key`.
    #[must_use]
    pub fn position(&self, key: &CategoryKey) -> Option<usize> {
        self.categories.iter().position(|c| c.key() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}
