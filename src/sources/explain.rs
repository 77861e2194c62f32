use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::entities::assessment::{AssessmentResult, Explanation};
use crate::error::PgxError;

const EXPLAIN_BASE: &str = "https://api.openai.com/v1";
const EXPLAIN_API: &str = "explain";
const EXPLAIN_BASE_ENV: &str = "PGXRISK_EXPLAIN_BASE";
const EXPLAIN_API_KEY_ENV: &str = "PGXRISK_EXPLAIN_API_KEY";
const EXPLAIN_MODEL_ENV: &str = "PGXRISK_EXPLAIN_MODEL";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TOOL_NAME: &str = "provide_explanations";

const SYSTEM_PROMPT: &str = "You are a clinical pharmacogenomics expert. For each drug assessment provided, generate a structured explanation. You MUST return valid JSON only, no markdown.

Return format:
{
  \"results\": [
    {
      \"drug\": \"DRUG_NAME\",
      \"explanation\": {
        \"summary\": \"1-2 sentence plain-language summary of the finding\",
        \"mechanism\": \"The pharmacogenomic mechanism (enzyme function, metabolism pathway, how the variant affects it)\",
        \"clinical_impact\": \"The clinical significance and what the patient/clinician should know\",
        \"variant_citations\": [\"rsXXXX\"]
      }
    }
  ]
}

Rules:
- Reference specific genes, variants (rs IDs), and star alleles
- Explain the biological mechanism accurately
- Match the computed risk label; do NOT contradict it
- Do NOT invent variant IDs or facts
- Keep language clear and professional
- Each field should be 2-4 sentences";

/// One explanation returned by the gateway, keyed by drug name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugExplanation {
    pub drug: String,
    pub explanation: Explanation,
}

#[async_trait::async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(
        &self,
        results: &[AssessmentResult],
    ) -> Result<Vec<DrugExplanation>, PgxError>;
}

#[derive(Debug, Deserialize)]
struct ExplanationsPayload {
    #[serde(default)]
    results: Vec<DrugExplanation>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Debug, Deserialize)]
struct ToolFunction {
    #[serde(default)]
    arguments: Option<String>,
}

pub struct ExplainClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: String,
    model: String,
}

impl ExplainClient {
    /// Builds a client from the environment; `None` when no API key is configured.
    pub fn from_env() -> Result<Option<Self>, PgxError> {
        let Some(api_key) = crate::sources::env_value(EXPLAIN_API_KEY_ENV) else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(EXPLAIN_BASE, EXPLAIN_BASE_ENV),
            api_key,
            model: crate::sources::env_value(EXPLAIN_MODEL_ENV)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }))
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, PgxError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request_body(&self, results: &[AssessmentResult]) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(results) },
            ],
            "tools": [tool_schema()],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
        })
    }
}

#[async_trait::async_trait]
impl ExplanationProvider for ExplainClient {
    async fn explain(
        &self,
        results: &[AssessmentResult],
    ) -> Result<Vec<DrugExplanation>, PgxError> {
        let url = self.endpoint("chat/completions");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(results))
            .send()
            .await?;

        let status = resp.status();
        let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
        let bytes = crate::sources::read_limited_body(resp, EXPLAIN_API).await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PgxError::Api {
                api: EXPLAIN_API.to_string(),
                message: "Rate limit exceeded (HTTP 429). Please try again later.".into(),
            });
        }
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Err(PgxError::Api {
                api: EXPLAIN_API.to_string(),
                message: "Usage limit reached (HTTP 402). Please add credits.".into(),
            });
        }
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(PgxError::Api {
                api: EXPLAIN_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        crate::sources::ensure_json_content_type(EXPLAIN_API, content_type.as_ref(), &bytes)?;
        let chat: ChatResponse =
            serde_json::from_slice(&bytes).map_err(|source| PgxError::ApiJson {
                api: EXPLAIN_API.to_string(),
                source,
            })?;
        parse_chat_response(chat)
    }
}

fn parse_chat_response(chat: ChatResponse) -> Result<Vec<DrugExplanation>, PgxError> {
    let Some(message) = chat.choices.into_iter().next().map(|c| c.message) else {
        return Err(PgxError::Api {
            api: EXPLAIN_API.to_string(),
            message: "No choices in response".into(),
        });
    };

    let raw = message
        .tool_calls
        .into_iter()
        .find_map(|call| call.function.arguments)
        .or(message.content)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PgxError::Api {
            api: EXPLAIN_API.to_string(),
            message: "No valid response from model".into(),
        })?;

    let payload: ExplanationsPayload =
        serde_json::from_str(&raw).map_err(|source| PgxError::ApiJson {
            api: EXPLAIN_API.to_string(),
            source,
        })?;
    Ok(payload.results)
}

fn user_prompt(results: &[AssessmentResult]) -> String {
    results
        .iter()
        .map(|r| {
            let profile = &r.pharmacogenomic_profile;
            let variants = serde_json::to_string(&profile.detected_variants)
                .unwrap_or_else(|_| "[]".to_string());
            format!(
                "Drug: {}\nGene: {}\nDiplotype: {}\nPhenotype: {}\nRisk: {}\nSeverity: {}\nVariants: {}\nRecommendation: {}",
                r.drug,
                profile.primary_gene,
                profile.diplotype,
                profile.phenotype,
                r.risk_assessment.risk_label,
                r.risk_assessment.severity,
                variants,
                r.clinical_recommendation.recommended_action,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn tool_schema() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Return structured pharmacogenomic explanations for each drug assessment",
            "parameters": {
                "type": "object",
                "properties": {
                    "results": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "drug": { "type": "string" },
                                "explanation": {
                                    "type": "object",
                                    "properties": {
                                        "summary": { "type": "string" },
                                        "mechanism": { "type": "string" },
                                        "clinical_impact": { "type": "string" },
                                        "variant_citations": { "type": "array", "items": { "type": "string" } }
                                    },
                                    "required": ["summary", "mechanism", "clinical_impact", "variant_citations"],
                                    "additionalProperties": false
                                }
                            },
                            "required": ["drug", "explanation"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["results"],
                "additionalProperties": false
            }
        }
    })
}
