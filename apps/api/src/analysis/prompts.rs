//! Prompt constants and builders for the Match Orchestrator.

use crate::analysis::orchestrator::ResumeInput;

/// System prompt for ranking — enforces JSON-only output.
pub const RANKING_SYSTEM: &str =
    "You are an expert HR specialist and resume analyzer. \
    Your task is to analyze resumes against a job description and provide \
    accurate, concise rankings focused on relevance, skills match, and job \
    requirements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Per-resume content cap inside the prompt. Resumes are routinely longer
/// than the signal the model needs, and the upstream call is priced by token.
pub const MAX_RESUME_CHARS: usize = 2000;

const RANKING_INSTRUCTIONS: &str = r#"
INSTRUCTIONS:
1. Analyze each resume against the job description
2. Score each candidate from 0-100 based on:
   - Skills match (40%)
   - Experience relevance (30%)
   - Education/qualifications (20%)
   - Overall fit (10%)
3. Provide 3-5 specific reasons for each score

RESPONSE FORMAT (JSON array, one element per resume, in any order):
[
  {
    "resume_number": 1,
    "score": 85,
    "reasons": ["Strong React experience", "5+ years relevant experience", "Previous similar role"]
  }
]

Respond with valid JSON only, no additional text."#;

/// Builds the ranking prompt for one batch of resumes. `resume_number` in
/// the model's answer is 1-based within this batch.
pub fn build_batch_prompt(job_description: &str, batch: &[ResumeInput]) -> String {
    let mut prompt = format!(
        "TASK: Analyze the following resumes against the job description and provide rankings.\n\n\
         JOB DESCRIPTION:\n{job_description}\n\nRESUMES TO ANALYZE:\n"
    );

    for (idx, resume) in batch.iter().enumerate() {
        let content: String = resume.text.chars().take(MAX_RESUME_CHARS).collect();
        prompt.push_str(&format!(
            "\nRESUME {number}:\nName: {name}\nEmail: {email}\nPhone: {phone}\nContent: {content}\n---\n",
            number = idx + 1,
            name = resume.contact.name.as_deref().unwrap_or("Unknown"),
            email = resume.contact.email.as_deref().unwrap_or("not provided"),
            phone = resume.contact.phone.as_deref().unwrap_or("not provided"),
        ));
    }

    prompt.push_str(RANKING_INSTRUCTIONS);
    prompt
}
