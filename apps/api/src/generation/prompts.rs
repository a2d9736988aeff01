// Prompt templates for the Content Generation Relay.
// Placeholders are `{name}` and are filled in one pass by `fill`, so values
// supplied by the caller are never re-scanned for placeholders.

pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach and cover letter writer. \
Create compelling, personalized cover letters that highlight relevant skills and experience. \
Write in a {tone} tone.";

pub const COVER_LETTER_PROMPT: &str = "Create a cover letter for the following:
Company: {company}
Position: {position}
Job Description: {job_description}
User Profile: {profile}

Additional context: {prompt}

Please write a compelling cover letter that:
1. Shows enthusiasm for the company and role
2. Highlights relevant skills and experience
3. Demonstrates knowledge about the company/industry
4. Uses a {tone} tone throughout
5. Is concise but impactful (aim for 3-4 paragraphs)";

pub const MOTIVATION_SYSTEM: &str = "You are a supportive career coach who provides \
encouragement and motivation for job seekers. Be uplifting, practical, and inspiring.";

pub const MOTIVATION_PROMPT: &str = "Generate motivational content for a job seeker. Context: {prompt}.

Please provide:
1. An inspiring quote
2. A practical tip for job searching
3. A positive affirmation

Make it personalized and encouraging.";

pub const JOB_MATCH_SYSTEM: &str = "You are a career advisor who analyzes job matches. \
Provide detailed analysis of how well a candidate fits a role.";

pub const JOB_MATCH_PROMPT: &str = "Analyze the job match for:
Position: {position} at {company}
Job Description: {job_description}
Candidate Profile: {profile}

Provide:
1. Match percentage (0-100%)
2. Strengths that align with the role
3. Potential gaps or areas for improvement
4. Specific suggestions for applying";

pub const SALARY_INSIGHTS_SYSTEM: &str =
    "You are a compensation expert who provides salary insights and negotiation advice.";

pub const SALARY_INSIGHTS_PROMPT: &str = "Provide salary insights for:
Position: {position}
Company: {company}
User Profile: {profile}
Additional Context: {prompt}

Include:
1. Estimated salary range for this role
2. Factors that could affect compensation
3. Negotiation tips
4. Market trends for this position";

/// Replaces every `{key}` in `template` with its value. Unknown placeholders are
/// left as written.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
