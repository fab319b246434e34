pub const SUMMARY_SYSTEM: &str = crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;

pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Given the following job description and candidate resume, write a short summary (three to five sentences) of the candidate's qualifications and whether they match the job requirements.

{grounding_instruction}

Job Description:
{job_description}

Candidate ({candidate_name}) Resume:
{resume_text}
"#;
