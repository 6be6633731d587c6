//! Plain-text rendering of a screening session for the terminal.

use cvats_core::analysis::{ParsedCv, ScoreReport};
use cvats_core::session::ScreeningSession;

const JOB_PREVIEW_CHARS: usize = 300;
const MAX_SKILLS: usize = 30;
const MAX_EXPERIENCE: usize = 5;
const MAX_BULLETS: usize = 6;
const MAX_EDUCATION: usize = 5;
const MAX_MATCHED: usize = 20;
const MAX_MISSING: usize = 15;

pub const NO_PREVIEW: &str = "No parsed preview for this file type yet (PDF only).";

pub fn upload_summary(session: &ScreeningSession) -> String {
    let doc = &session.document;
    let mut lines = vec![
        "== CV uploaded ==".to_string(),
        format!("File:    {}", doc.file_name),
        format!("Size:    {:.2} MB", doc.size_bytes as f64 / (1024.0 * 1024.0)),
        format!("Key:     {}", doc.key),
        String::new(),
        "== Target position ==".to_string(),
    ];

    let total = session.job_description.chars().count();
    if total > JOB_PREVIEW_CHARS {
        let preview: String = session.job_description.chars().take(JOB_PREVIEW_CHARS).collect();
        lines.push(format!("{preview}..."));
        lines.push(format!("(showing first {JOB_PREVIEW_CHARS} characters)"));
    } else {
        lines.push(session.job_description.clone());
    }
    lines.join("\n")
}

pub fn parsed_profile(cv: &ParsedCv) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut lines = vec![
        "== Parsed CV ==".to_string(),
        format!("Name:     {}", field(&cv.name)),
        format!("Email:    {}", field(&cv.contact.email)),
        format!("Phone:    {}", field(&cv.contact.phone)),
        format!("Location: {}", field(&cv.contact.location)),
        format!("LinkedIn: {}", field(&cv.contact.linkedin)),
        format!("GitHub:   {}", field(&cv.contact.github)),
        String::new(),
        "-- Skills --".to_string(),
    ];

    if cv.skills.is_empty() {
        lines.push("No skills parsed".into());
    } else {
        lines.extend(cv.skills.iter().take(MAX_SKILLS).map(|s| format!("  * {s}")));
    }

    lines.push(String::new());
    lines.push("-- Experience --".into());
    if cv.experience.is_empty() {
        lines.push("No experience parsed".into());
    }
    for exp in cv.experience.iter().take(MAX_EXPERIENCE) {
        lines.push(format!("  {} @ {}", field(&exp.title), field(&exp.company)));
        lines.push(format!(
            "    {} – {} • {}",
            field(&exp.start),
            field(&exp.end),
            field(&exp.location)
        ));
        lines.extend(exp.bullets.iter().take(MAX_BULLETS).map(|b| format!("    - {b}")));
    }

    lines.push(String::new());
    lines.push("-- Education --".into());
    if cv.education.is_empty() {
        lines.push("No education parsed".into());
    }
    for edu in cv.education.iter().take(MAX_EDUCATION) {
        lines.push(format!("  {} – {}", field(&edu.degree), field(&edu.school)));
        let mut dates = format!("    {} – {}", field(&edu.start), field(&edu.end));
        if let Some(gpa) = &edu.gpa {
            dates.push_str(&format!(" • GPA: {gpa}"));
        }
        lines.push(dates);
    }

    lines.join("\n")
}

pub fn score_report(report: &ScoreReport) -> String {
    let mut lines = vec![
        "== ATS score ==".to_string(),
        format!("{:.0}/100 ({})", report.score, report.rating.label()),
        String::new(),
        format!("Matched keywords ({}):", report.matched_keywords.len()),
    ];
    lines.push(keyword_line(&report.matched_keywords, MAX_MATCHED, "No keyword matches found"));

    lines.push(format!("Missing keywords ({}):", report.missing_keywords.len()));
    lines.push(keyword_line(&report.missing_keywords, MAX_MISSING, "No missing keywords found"));

    if !report.recommendations.is_empty() {
        lines.push(String::new());
        lines.push("Recommendations:".into());
        lines.extend(report.recommendations.iter().map(|r| format!("  -> {r}")));
    }
    lines.join("\n")
}

fn keyword_line(keywords: &[String], limit: usize, empty: &str) -> String {
    if keywords.is_empty() {
        return format!("  {empty}");
    }
    let shown: Vec<&str> = keywords.iter().take(limit).map(String::as_str).collect();
    format!("  {}", shown.join(", "))
}
