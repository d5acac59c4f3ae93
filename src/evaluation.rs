//! Heuristic evaluators that turn an output into a score.
//!
//! ```ignore
//! let evaluator = ContainsEvaluator::new();
//! let score = evaluator.evaluate(&json!("q"), &json!("The answer is 42"), Some(&json!("42")));
//! trace.score(score.into_score());
//! ```

use crate::error::{LangfuseError, Result};
use crate::observation::{ScoreAttributes, ScoreDataType};
use regex::Regex;
use serde_json::Value;

/// Score produced by an [`Evaluator`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationScore {
    pub name: String,
    pub value: f64,
    pub data_type: ScoreDataType,
    pub comment: Option<String>,
}

impl EvaluationScore {
    fn numeric(name: &str, value: f64, comment: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value,
            data_type: ScoreDataType::Numeric,
            comment: Some(comment.into()),
        }
    }

    fn pass_fail(name: &str, passed: bool, pass: &str, fail: &str) -> Self {
        Self::numeric(
            name,
            if passed { 1.0 } else { 0.0 },
            if passed { pass } else { fail },
        )
    }

    /// Convert into score attributes ready for `score()` on a trace or observation.
    pub fn into_score(self) -> ScoreAttributes {
        let mut score = ScoreAttributes::new(self.name, self.value).data_type(self.data_type);
        score.comment = self.comment;
        score
    }
}

/// Scores an output, optionally against an expected value.
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, input: &Value, output: &Value, expected: Option<&Value>) -> EvaluationScore;
}

/// Strings render without quotes; everything else as JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn missing_expected(name: &str) -> EvaluationScore {
    EvaluationScore::numeric(name, 0.0, "No expected value provided")
}

/// 1 when the trimmed output equals the trimmed expected value.
pub struct ExactMatchEvaluator {
    name: String,
}

impl ExactMatchEvaluator {
    pub fn new() -> Self {
        Self {
            name: "exact_match".to_string(),
        }
    }
}

impl Default for ExactMatchEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for ExactMatchEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _input: &Value, output: &Value, expected: Option<&Value>) -> EvaluationScore {
        let Some(expected) = expected else {
            return missing_expected(&self.name);
        };
        let matched = as_text(output).trim() == as_text(expected).trim();
        EvaluationScore::pass_fail(&self.name, matched, "Exact match", "No match")
    }
}

/// 1 when the output contains the expected text. Case-insensitive unless configured.
pub struct ContainsEvaluator {
    name: String,
    case_sensitive: bool,
}

impl ContainsEvaluator {
    pub fn new() -> Self {
        Self {
            name: "contains".to_string(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

impl Default for ContainsEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for ContainsEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _input: &Value, output: &Value, expected: Option<&Value>) -> EvaluationScore {
        let Some(expected) = expected else {
            return missing_expected(&self.name);
        };
        let (haystack, needle) = if self.case_sensitive {
            (as_text(output), as_text(expected))
        } else {
            (as_text(output).to_lowercase(), as_text(expected).to_lowercase())
        };
        EvaluationScore::pass_fail(
            &self.name,
            haystack.contains(&needle),
            "Contains expected text",
            "Does not contain expected text",
        )
    }
}

/// Checks output length (in characters) against optional bounds.
///
/// Without bounds the score is the length itself.
pub struct LengthEvaluator {
    name: String,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl LengthEvaluator {
    pub fn new(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            name: "length".to_string(),
            min_length,
            max_length,
        }
    }
}

impl Evaluator for LengthEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _input: &Value, output: &Value, _expected: Option<&Value>) -> EvaluationScore {
        let length = as_text(output).chars().count();

        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => EvaluationScore::pass_fail(
                &self.name,
                (min..=max).contains(&length),
                &format!("Length {} within range", length),
                &format!("Length {} outside range {}-{}", length, min, max),
            ),
            (Some(min), None) => EvaluationScore::pass_fail(
                &self.name,
                length >= min,
                &format!("Length {} meets minimum", length),
                &format!("Length {} below minimum {}", length, min),
            ),
            (None, Some(max)) => EvaluationScore::pass_fail(
                &self.name,
                length <= max,
                &format!("Length {} within maximum", length),
                &format!("Length {} exceeds maximum {}", length, max),
            ),
            (None, None) => {
                EvaluationScore::numeric(&self.name, length as f64, format!("Length: {}", length))
            }
        }
    }
}

/// 1 when the output matches a regular expression.
pub struct RegexEvaluator {
    name: String,
    pattern: Regex,
}

impl RegexEvaluator {
    /// # Errors
    ///
    /// [`LangfuseError::ValidationError`] when `pattern` does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| LangfuseError::ValidationError(format!("Invalid regex pattern: {}", e)))?;
        Ok(Self {
            name: "regex".to_string(),
            pattern,
        })
    }
}

impl Evaluator for RegexEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _input: &Value, output: &Value, _expected: Option<&Value>) -> EvaluationScore {
        EvaluationScore::pass_fail(
            &self.name,
            self.pattern.is_match(&as_text(output)),
            "Regex pattern matched",
            "Regex pattern not matched",
        )
    }
}

/// Normalized Levenshtein similarity between output and expected value, in `[0, 1]`.
pub struct SimilarityEvaluator {
    name: String,
}

impl SimilarityEvaluator {
    pub fn new() -> Self {
        Self {
            name: "similarity".to_string(),
        }
    }
}

impl Default for SimilarityEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for SimilarityEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _input: &Value, output: &Value, expected: Option<&Value>) -> EvaluationScore {
        let Some(expected) = expected else {
            return missing_expected(&self.name);
        };
        let similarity = similarity(&as_text(output), &as_text(expected));
        EvaluationScore::numeric(
            &self.name,
            similarity,
            format!("Similarity: {:.2}%", similarity * 100.0),
        )
    }
}

fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let distance = levenshtein(&a, &b);
    1.0 - distance as f64 / a.len().max(b.len()) as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
