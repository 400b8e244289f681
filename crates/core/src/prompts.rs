use serde_json::{json, Value};

pub const EXTRACTION_PROMPT: &str = "You are screening job applications. Read the attached resume \
and extract the candidate's details. Report the full name, email address, phone number, age in \
years, governorate or city of residence, and the position the candidate applied for when the \
document states them; omit any field the document does not mention. List every professional \
skill as a separate entry and write a short summary of the candidate's work experience.";

/// Response schema for profile extraction. `name`, `skills` and
/// `experienceSummary` are mandatory.
pub fn profile_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "email": { "type": "STRING" },
            "phone": { "type": "STRING" },
            "age": { "type": "INTEGER" },
            "governorate": { "type": "STRING" },
            "appliedFor": { "type": "STRING" },
            "skills": { "type": "ARRAY", "items": { "type": "STRING" } },
            "experienceSummary": { "type": "STRING" }
        },
        "required": ["name", "skills", "experienceSummary"]
    })
}

pub fn score_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "matchScore": {
                "type": "INTEGER",
                "description": "How well the candidate fits the job, from 0 to 100."
            }
        },
        "required": ["matchScore"]
    })
}

pub fn scoring_prompt(job_description: &str, skills: &str, experience_summary: &str) -> String {
    format!(
        "You are an experienced recruiter. Compare the candidate below with the job \
description and rate how well they match as an integer percentage between 0 and 100.\n\n\
JOB DESCRIPTION:\n{job_description}\n\n\
CANDIDATE SKILLS:\n{skills}\n\n\
CANDIDATE EXPERIENCE:\n{experience_summary}"
    )
}
