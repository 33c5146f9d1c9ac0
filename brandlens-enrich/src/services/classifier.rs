//! Creator classification boundary
//!
//! Classification is an opaque enrichment function: the pipeline hands over a
//! creator profile and receives a category decision. Any provider failure
//! (transport error, bad status, empty or malformed response) degrades to the
//! default classification instead of failing the record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("network error: {0}")]
    Network(String),

    #[error("classifier returned status {0}")]
    Status(u16),

    #[error("empty classifier response")]
    EmptyResponse,

    #[error("malformed classifier response: {0}")]
    Malformed(String),
}

/// Category decision for one creator
///
/// Exactly one of the three category flags is true on a well-formed value;
/// `normalized` repairs violations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub is_brand: bool,
    pub is_matrix_account: bool,
    pub is_ugc_creator: bool,
    /// Extracted brand name, empty when no clear partnership signal exists
    pub brand_name: String,
    pub confidence: f32,
    pub details: String,
}

impl Classification {
    /// Fallback classification: generic UGC creator, no brand attribution
    pub fn default_ugc(details: &str) -> Self {
        Self {
            is_brand: false,
            is_matrix_account: false,
            is_ugc_creator: true,
            brand_name: String::new(),
            confidence: 0.0,
            details: details.to_string(),
        }
    }

    /// Enforce category mutual exclusivity
    ///
    /// A response marking zero or multiple categories is not trustworthy;
    /// it collapses to UGC with no brand attribution.
    pub fn normalized(mut self, unique_id: &str) -> Self {
        let marked = [self.is_brand, self.is_matrix_account, self.is_ugc_creator]
            .iter()
            .filter(|&&flag| flag)
            .count();
        if marked != 1 {
            tracing::warn!(
                handle = %unique_id,
                marked,
                "Classifier selected an invalid category combination, defaulting to UGC"
            );
            self.is_brand = false;
            self.is_matrix_account = false;
            self.is_ugc_creator = true;
            self.brand_name.clear();
        }
        self
    }
}

/// Profile fields handed to the classifier
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub unique_id: String,
    pub nickname: String,
    pub signature: String,
    /// Content context (video title / description), may be empty
    pub context: String,
}

/// Opaque classification function boundary
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<Classification, ClassifyError>;
}

/// Surface-level official-account signals from the profile text
pub fn is_official_account(unique_id: &str, nickname: &str, signature: &str) -> bool {
    const OFFICIAL_INDICATORS: [&str; 8] = [
        "official",
        "verified",
        "@company.com",
        "@brand.com",
        "team",
        "support",
        "headquarters",
        "corporate",
    ];

    let combined = format!("{} {} {}", unique_id, nickname, signature).to_lowercase();
    OFFICIAL_INDICATORS
        .iter()
        .any(|indicator| combined.contains(indicator))
}

/// Parse the 6-field pipe-separated classifier response
///
/// Expected shape: `True|False|False|BrandName|0.9|Brief explanation`
/// (official brand / matrix account / UGC creator / brand name or "None" /
/// confidence / details).
pub fn parse_classification(text: &str, unique_id: &str) -> Result<Classification, ClassifyError> {
    let parts: Vec<&str> = text.trim().split('|').map(str::trim).collect();
    if parts.len() != 6 {
        return Err(ClassifyError::Malformed(format!(
            "expected 6 pipe-separated fields, got {}",
            parts.len()
        )));
    }

    let is_brand = parts[0].eq_ignore_ascii_case("true");
    let is_matrix = parts[1].eq_ignore_ascii_case("true");
    let is_ugc = parts[2].eq_ignore_ascii_case("true");
    let brand_name = if parts[3].eq_ignore_ascii_case("none") {
        String::new()
    } else {
        parts[3].to_string()
    };
    let confidence = parts[4].parse::<f32>().unwrap_or(0.0);

    Ok(Classification {
        is_brand,
        is_matrix_account: is_matrix,
        is_ugc_creator: is_ugc,
        brand_name,
        confidence,
        details: parts[5].to_string(),
    }
    .normalized(unique_id))
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    text: String,
}

/// Prompt-based classifier backed by a text-generation API
pub struct PromptClassifier {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PromptClassifier {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn build_prompt(&self, request: &ClassifyRequest) -> String {
        let is_official = is_official_account(&request.unique_id, &request.nickname, &request.signature);

        format!(
            "Analyze the following creator profile and classify it into exactly ONE category.\n\
             \n\
             Creator Username: {unique_id}\n\
             Display Name: {nickname}\n\
             Bio/Signature: {signature}\n\
             Is Official Account: {is_official}\n\
             Content Context: {context}\n\
             \n\
             Categories:\n\
             1. OFFICIAL_BRAND: the account is the brand itself (username contains the \
             brand/product name, bio promotes its own product).\n\
             2. MATRIX_ACCOUNT: the profile shows a clear affiliation with ONE specific \
             brand (employment, ambassadorship, partnership stated in the profile).\n\
             3. UGC_CREATOR: an independent creator; attach a brand name ONLY when clear \
             partnership signals exist (#ad, #sponsored, discount codes, affiliate links).\n\
             \n\
             Respond with EXACTLY 6 values separated by pipes (|):\n\
             OFFICIAL_BRAND [True/False] | MATRIX_ACCOUNT [True/False] | \
             UGC_CREATOR [True/False] | Brand Name or \"None\" | \
             Confidence [0.0-1.0] | Brief explanation\n\
             \n\
             Example: True|False|False|GetNote AI|0.95|Username contains the brand name",
            unique_id = request.unique_id,
            nickname = request.nickname,
            signature = request.signature,
            is_official = is_official,
            context = request.context,
        )
    }
}

#[async_trait]
impl Classifier for PromptClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<Classification, ClassifyError> {
        let url = format!("{}/v1/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: self.build_prompt(request),
        };

        tracing::debug!(handle = %request.unique_id, "Requesting classification");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;

        if payload.text.trim().is_empty() {
            return Err(ClassifyError::EmptyResponse);
        }

        parse_classification(&payload.text, &request.unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wellformed_response() {
        let classification =
            parse_classification("True|False|False|GetNote AI|0.95|Username matches brand", "getnoteai")
                .unwrap();
        assert!(classification.is_brand);
        assert!(!classification.is_matrix_account);
        assert!(!classification.is_ugc_creator);
        assert_eq!(classification.brand_name, "GetNote AI");
        assert!((classification.confidence - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn none_brand_name_becomes_empty() {
        let classification =
            parse_classification("False|False|True|None|0.9|Generic reviewer", "someone").unwrap();
        assert!(classification.is_ugc_creator);
        assert!(classification.brand_name.is_empty());
    }

    #[test]
    fn multiple_categories_collapse_to_ugc() {
        let classification =
            parse_classification("True|True|False|Acme|0.7|confused", "acme").unwrap();
        assert!(!classification.is_brand);
        assert!(!classification.is_matrix_account);
        assert!(classification.is_ugc_creator);
        assert!(classification.brand_name.is_empty());
    }

    #[test]
    fn zero_categories_collapse_to_ugc() {
        let classification =
            parse_classification("False|False|False|None|0.1|unsure", "someone").unwrap();
        assert!(classification.is_ugc_creator);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = parse_classification("True|False|False", "someone").unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)));
    }

    #[test]
    fn unparsable_confidence_defaults_to_zero() {
        let classification =
            parse_classification("False|False|True|None|high|details", "someone").unwrap();
        assert_eq!(classification.confidence, 0.0);
    }

    #[test]
    fn official_indicators_are_case_insensitive() {
        assert!(is_official_account("acme_Official", "Acme", ""));
        assert!(is_official_account("acme", "Acme Support", ""));
        assert!(!is_official_account("nat", "Nat", "just vibes"));
    }
}
