use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CvatsError, Result};

// ── Parsed CV ──────────────────────────────────────────────────────────────
//
// The parse endpoint is backed by an LLM, so every field is optional and
// shapes drift. Wrong-typed fields degrade to empty instead of failing the
// whole document.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCv {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub contact: Contact,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experience: Vec<Experience>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub education: Vec<Education>,
    /// Fields this client does not interpret; sent back untouched to the score endpoint.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub parsed: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ParseResponse {
    pub fn into_parsed(self) -> Result<ParsedCv> {
        if !self.ok {
            return Err(CvatsError::Server(
                self.error.unwrap_or_else(|| "Parse failed".to_string()),
            ));
        }
        match self.parsed {
            Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value)?),
            _ => Ok(ParsedCv::default()),
        }
    }
}

// ── ATS score ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest<'a> {
    pub parsed_cv: &'a ParsedCv,
    pub job_description: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticMatch {
    #[serde(default, rename = "matchedKeywords", deserialize_with = "lenient_opt_string_list")]
    pub matched_keywords: Option<Vec<String>>,
    #[serde(default, rename = "missingKeywords", deserialize_with = "lenient_opt_string_list")]
    pub missing_keywords: Option<Vec<String>>,
}

/// Raw score payload. Older backends nest keyword lists under `semantic`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string_list")]
    pub matched_keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_opt_string_list")]
    pub missing_keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub semantic: SemanticMatch,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub notes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRating {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f64,
    pub rating: ScoreRating,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ScoreResponse {
    pub fn into_report(self) -> Result<ScoreReport> {
        if !self.ok {
            return Err(CvatsError::Server(
                self.error.unwrap_or_else(|| "Score failed".to_string()),
            ));
        }

        let score = self.score.unwrap_or(0.0);
        let matched_keywords = self
            .matched_keywords
            .or(self.semantic.matched_keywords)
            .unwrap_or_default();
        let missing_keywords = self
            .missing_keywords
            .or(self.semantic.missing_keywords)
            .unwrap_or_default();
        let mut recommendations = self.notes;
        recommendations.extend(self.suggestions);

        Ok(ScoreReport {
            score,
            rating: ScoreRating::from_score(score),
            matched_keywords,
            missing_keywords,
            recommendations,
        })
    }
}

/// Parse and score endpoints.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParseResponse>;
    async fn score(&self, parsed: &ParsedCv, job_description: &str) -> Result<ScoreResponse>;
}

// ── Lenient field decoding ─────────────────────────────────────────────────

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string).filter(|s| !s.is_empty()))
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_struct<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_opt_string_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => {
            Some(items.into_iter().filter_map(scalar_to_string).collect())
        }
        _ => None,
    })
}

fn lenient_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string_list(deserializer)?.unwrap_or_default())
}
