pub const RESUME_EXTRACT_SYSTEM: &str = "You are an expert resume parser with deep knowledge of \
    applicant tracking systems and recruitment practice. You extract information from resume \
    text into a fixed JSON structure. You never invent information that is not in the text.";

pub const RESUME_EXTRACT_PROMPT: &str = r#"Extract the resume below into JSON with exactly this shape:

{
  "basics": {
    "name": string | null,
    "email": string | null,
    "phone": string | null,
    "location": string | null,
    "summary": string | null,
    "links": [string]
  },
  "experience": [
    {
      "company": string | null,
      "title": string | null,
      "location": string | null,
      "start_date": string | null,
      "end_date": string | null,
      "highlights": [string]
    }
  ],
  "education": [
    {
      "institution": string | null,
      "degree": string | null,
      "field": string | null,
      "start_date": string | null,
      "end_date": string | null
    }
  ],
  "skills": { "<category>": [string] },
  "certifications": [string],
  "languages": [string]
}

Rules:
1. Only use information present in the resume text. Use null for missing scalars and [] for missing lists.
2. "skills" maps a category name (e.g. "Programming Languages", "Frameworks", "Databases",
   "Cloud Platforms & DevOps", "Tools & Libraries", "Soft Skills") to the skills in that category.
   If the resume does not categorise its skills, infer sensible categories.
3. Keep dates as written in the resume.

RESUME:
{resume_text}"#;
