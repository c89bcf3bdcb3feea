// Prompt constants for suggestion generation.

/// Suggestion prompt template. Replace `{job_name}`, `{job_location}`,
/// `{job_type}`, `{job_description}`, and `{resume_json}` before sending.
/// The schema block below must match `SuggestionSet` field-for-field.
pub const SUGGESTION_PROMPT_TEMPLATE: &str = r#"You are an expert resume consultant. Based on the following job description and the user's current resume, provide specific, actionable suggestions to tailor the resume for this position.

**Job Details:**
- Position: {job_name}
- Location: {job_location}
- Type: {job_type}

**Job Description:**
{job_description}

**User's Current Resume:**
{resume_json}

Please provide your response in the following JSON format:
{
  "suggestions": [
    {
      "category": "skills",
      "suggestion": "Add specific technical skills mentioned in the job description",
      "priority": "high"
    },
    {
      "category": "experience",
      "suggestion": "Reformat experience section to highlight relevant achievements",
      "priority": "medium"
    }
  ],
  "resume_updates": {
    "summary": "Updated professional summary focusing on relevant experience",
    "skills": ["skill1", "skill2", "skill3"],
    "experience_highlights": ["highlight1", "highlight2"]
  },
  "keywords_to_include": ["keyword1", "keyword2", "keyword3"],
  "overall_assessment": "Brief assessment of resume-job fit"
}

Focus on:
1. Identifying missing skills or experiences that are mentioned in the job description
2. Suggesting specific keywords to include
3. Recommending how to rephrase existing content to better match the job requirements
4. Providing actionable, specific suggestions rather than general advice

Respond with valid JSON only. Do not include any text outside the JSON object."#;
