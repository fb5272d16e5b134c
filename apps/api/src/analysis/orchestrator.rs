//! Match Orchestrator — turns a job description plus extracted resumes into
//! a ranked candidate list via the upstream model.
//!
//! `AppState` holds an `Arc<dyn ResumeRanker>` so handlers and tests never
//! depend on the concrete LLM-backed implementation.
//!
//! Parsing is two-stage: strict serde first, then a lenient best-effort pass
//! over whatever JSON-shaped content the model produced. Only when both fail
//! does the caller see `MalformedModelOutput`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::prompts::{build_batch_prompt, RANKING_SYSTEM};
use crate::errors::AppError;
use crate::extraction::contact::CandidateContact;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::analysis::CandidateResult;

/// At most this many candidates are returned, regardless of batch size.
/// Fixed design constant; it does not scale with input size.
pub const TOP_CANDIDATES: usize = 7;

/// A candidate below this score does not count as a match. When no candidate
/// reaches it, the outcome carries `no_match = true`.
pub const MIN_MATCH_SCORE: u8 = 40;

/// Resumes sent to the model per upstream call.
const BATCH_SIZE: usize = 10;

/// One successfully extracted resume, ready for ranking.
#[derive(Debug, Clone)]
pub struct ResumeInput {
    pub filename: String,
    pub contact: CandidateContact,
    pub text: String,
}

/// The ordered result of one ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct RankingOutcome {
    pub candidates: Vec<CandidateResult>,
    pub no_match: bool,
}

/// Ranks a batch of resumes against a job description.
///
/// Implementations must produce a globally consistent ranking across the
/// whole batch: ranks dense from 1, scores non-increasing.
#[async_trait]
pub trait ResumeRanker: Send + Sync {
    async fn rank(
        &self,
        job_text: &str,
        resumes: &[ResumeInput],
    ) -> Result<RankingOutcome, AppError>;
}

/// One verdict for one resume, as the model reports it.
/// `resume_number` is 1-based within the batch the prompt described.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    resume_number: usize,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    reasons: Vec<String>,
}

/// A candidate scored by the model but not yet ranked.
#[derive(Debug, Clone)]
struct ScoredCandidate {
    contact: CandidateContact,
    score: u8,
    reasons: Vec<String>,
}

/// The production ranker: one upstream call per batch of `BATCH_SIZE`
/// resumes, verdicts joined back to inputs by resume number, then a single
/// global ordering across all batches.
pub struct LlmResumeRanker {
    llm: LlmClient,
}

impl LlmResumeRanker {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeRanker for LlmResumeRanker {
    async fn rank(
        &self,
        job_text: &str,
        resumes: &[ResumeInput],
    ) -> Result<RankingOutcome, AppError> {
        let mut scored = Vec::with_capacity(resumes.len());

        for (batch_idx, batch) in resumes.chunks(BATCH_SIZE).enumerate() {
            info!("Ranking batch {} ({} resumes)", batch_idx + 1, batch.len());

            let prompt = build_batch_prompt(job_text, batch);
            let response = self
                .llm
                .call(&prompt, RANKING_SYSTEM)
                .await
                .map_err(map_llm_error)?;
            let text = response
                .text()
                .ok_or(LlmError::EmptyContent)
                .map_err(map_llm_error)?;

            let verdicts = parse_verdicts(text)?;
            scored.extend(join_verdicts(batch, verdicts));
        }

        Ok(aggregate(scored))
    }
}

fn map_llm_error(err: LlmError) -> AppError {
    match err {
        LlmError::EmptyContent => AppError::MalformedModelOutput(err.to_string()),
        other => AppError::UpstreamUnavailable(other.to_string()),
    }
}

/// Parses the model's answer into verdicts: strict serde first, lenient
/// extraction second, `MalformedModelOutput` only when both fail.
fn parse_verdicts(text: &str) -> Result<Vec<ModelVerdict>, AppError> {
    let text = strip_json_fences(text);

    if let Ok(verdicts) = serde_json::from_str::<Vec<ModelVerdict>>(text) {
        return Ok(verdicts);
    }

    warn!("Strict parse of model output failed, trying lenient extraction");
    parse_verdicts_lenient(text).ok_or_else(|| {
        AppError::MalformedModelOutput(format!(
            "no usable verdict array in model output (first 200 chars: {:.200})",
            text
        ))
    })
}

/// Best-effort pass: slice the outermost JSON array out of surrounding
/// prose, then pull fields element by element, tolerating scores encoded as
/// strings or floats and reasons given as a single string.
fn parse_verdicts_lenient(text: &str) -> Option<Vec<ModelVerdict>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let elements = value.as_array()?;

    let mut verdicts = Vec::with_capacity(elements.len());
    for element in elements {
        let Some(resume_number) = lenient_usize(element.get("resume_number")?) else {
            continue;
        };
        let score = element.get("score").and_then(lenient_i64).unwrap_or(0);
        let reasons = match element.get("reasons") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        };
        verdicts.push(ModelVerdict {
            resume_number,
            score,
            reasons,
        });
    }

    if verdicts.is_empty() {
        None
    } else {
        Some(verdicts)
    }
}

fn lenient_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Joins model verdicts back to the batch inputs. Verdicts pointing at
/// resume numbers outside the batch are dropped; contact details always come
/// from our own extraction, never from the model.
fn join_verdicts(batch: &[ResumeInput], verdicts: Vec<ModelVerdict>) -> Vec<ScoredCandidate> {
    let mut scored = Vec::with_capacity(verdicts.len());
    for verdict in verdicts {
        let Some(input) = verdict
            .resume_number
            .checked_sub(1)
            .and_then(|idx| batch.get(idx))
        else {
            warn!(
                "Model referenced resume_number {} outside batch of {}",
                verdict.resume_number,
                batch.len()
            );
            continue;
        };
        scored.push(ScoredCandidate {
            contact: input.contact.clone(),
            score: verdict.score.clamp(0, 100) as u8,
            reasons: verdict.reasons,
        });
    }
    scored
}

/// Global ordering across all batches: stable sort by score descending (ties
/// keep the model's ordering), cap at `TOP_CANDIDATES`, assign dense 1-based
/// ranks, and flag the outcome when nobody reaches `MIN_MATCH_SCORE`.
fn aggregate(mut scored: Vec<ScoredCandidate>) -> RankingOutcome {
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(TOP_CANDIDATES);

    let no_match = !scored.iter().any(|c| c.score >= MIN_MATCH_SCORE);

    let candidates = scored
        .into_iter()
        .enumerate()
        .map(|(idx, c)| CandidateResult {
            rank: idx as u32 + 1,
            name: c.contact.name,
            email: c.contact.email,
            phone: c.contact.phone,
            score: c.score,
            reasons: c.reasons,
        })
        .collect();

    RankingOutcome {
        candidates,
        no_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn input(name: &str) -> ResumeInput {
        ResumeInput {
            filename: format!("{name}.pdf"),
            contact: CandidateContact {
                name: Some(name.to_string()),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                phone: None,
            },
            text: format!("{name} is an engineer."),
        }
    }

    fn scored(name: &str, score: u8) -> ScoredCandidate {
        ScoredCandidate {
            contact: CandidateContact {
                name: Some(name.to_string()),
                email: None,
                phone: None,
            },
            score,
            reasons: vec!["reason".to_string()],
        }
    }

    #[test]
    fn test_parse_verdicts_strict() {
        let text = r#"[{"resume_number": 1, "score": 85, "reasons": ["Strong match"]}]"#;
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].resume_number, 1);
        assert_eq!(verdicts[0].score, 85);
    }

    #[test]
    fn test_parse_verdicts_fenced() {
        let text = "```json\n[{\"resume_number\": 2, \"score\": 40, \"reasons\": []}]\n```";
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(verdicts[0].resume_number, 2);
    }

    #[test]
    fn test_parse_verdicts_lenient_with_surrounding_prose() {
        let text = r#"Here are the rankings you asked for:
[{"resume_number": "1", "score": "72", "reasons": "Basic skills match"}]
Let me know if you need more detail."#;
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(verdicts[0].resume_number, 1);
        assert_eq!(verdicts[0].score, 72);
        assert_eq!(verdicts[0].reasons, vec!["Basic skills match"]);
    }

    #[test]
    fn test_parse_verdicts_lenient_float_score() {
        let text = r#"[{"resume_number": 1, "score": 66.7, "reasons": []}]"#;
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(verdicts[0].score, 67);
    }

    #[test]
    fn test_parse_verdicts_rejects_garbage() {
        let err = parse_verdicts("I cannot rank these resumes.").unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput(_)));
    }

    #[test]
    fn test_join_drops_out_of_range_numbers() {
        let batch = vec![input("Alice"), input("Bob")];
        let verdicts = vec![
            ModelVerdict {
                resume_number: 1,
                score: 90,
                reasons: vec![],
            },
            ModelVerdict {
                resume_number: 5,
                score: 80,
                reasons: vec![],
            },
            ModelVerdict {
                resume_number: 0,
                score: 70,
                reasons: vec![],
            },
        ];
        let scored = join_verdicts(&batch, verdicts);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].contact.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_join_clamps_scores() {
        let batch = vec![input("Alice"), input("Bob")];
        let verdicts = vec![
            ModelVerdict {
                resume_number: 1,
                score: 150,
                reasons: vec![],
            },
            ModelVerdict {
                resume_number: 2,
                score: -10,
                reasons: vec![],
            },
        ];
        let scored = join_verdicts(&batch, verdicts);
        assert_eq!(scored[0].score, 100);
        assert_eq!(scored[1].score, 0);
    }

    #[test]
    fn test_aggregate_caps_at_top_seven_with_dense_ranks() {
        let scored: Vec<_> = (0..10)
            .map(|i| scored(&format!("c{i}"), 50 + i as u8))
            .collect();
        let outcome = aggregate(scored);

        assert_eq!(outcome.candidates.len(), TOP_CANDIDATES);
        assert!(!outcome.no_match);
        for (idx, candidate) in outcome.candidates.iter().enumerate() {
            assert_eq!(candidate.rank, idx as u32 + 1);
        }
        for pair in outcome.candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_aggregate_ties_keep_original_order() {
        let outcome = aggregate(vec![scored("first", 80), scored("second", 80)]);
        assert_eq!(outcome.candidates[0].name.as_deref(), Some("first"));
        assert_eq!(outcome.candidates[1].name.as_deref(), Some("second"));
    }

    #[test]
    fn test_aggregate_flags_no_match_below_threshold() {
        let outcome = aggregate(vec![scored("a", 39), scored("b", 10)]);
        assert!(outcome.no_match);

        let outcome = aggregate(vec![scored("a", MIN_MATCH_SCORE)]);
        assert!(!outcome.no_match);
    }

    #[test]
    fn test_aggregate_empty_input_is_no_match() {
        let outcome = aggregate(Vec::new());
        assert!(outcome.candidates.is_empty());
        assert!(outcome.no_match);
    }

    #[tokio::test]
    async fn test_llm_ranker_makes_one_call_per_batch() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(json!({
                    "content": [{
                        "type": "text",
                        "text": "[{\"resume_number\": 1, \"score\": 75, \"reasons\": [\"ok\"]}]"
                    }],
                    "usage": {"input_tokens": 100, "output_tokens": 20}
                }));
            })
            .await;

        let ranker = LlmResumeRanker::new(LlmClient::with_base_url(
            "test-key".into(),
            server.url("/v1/messages"),
        ));

        // 12 resumes at a batch size of 10 means exactly two upstream calls
        let resumes: Vec<_> = (0..12).map(|i| input(&format!("c{i}"))).collect();
        let outcome = ranker.rank("Backend role", &resumes).await.unwrap();

        mock.assert_hits(2);
        // Both batches answered for resume 1 only, so two candidates total
        assert_eq!(outcome.candidates.len(), 2);
        assert!(!outcome.no_match);
    }

    #[tokio::test]
    async fn test_llm_ranker_maps_upstream_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(503).body("upstream down");
            })
            .await;

        let ranker = LlmResumeRanker::new(LlmClient::with_base_url(
            "test-key".into(),
            server.url("/v1/messages"),
        ));

        let err = ranker
            .rank("Backend role", &[input("Alice")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
