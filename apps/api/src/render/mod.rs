//! Document rendering engine — deterministic transformation of a resume
//! snapshot into LaTeX.
//!
//! Every leaf string is escaped for LaTeX's reserved characters before it is
//! embedded. A section that has no content after trimming renders to the
//! empty string, heading included, independently of the other sections.
//! Template substitution is a pure string operation; the only failure mode
//! at this layer's boundary is a missing template file (see `template.rs`).

pub mod handlers;
pub mod template;

use anyhow::{anyhow, Result};

use crate::models::resume::Resume;

/// Marker line carrying the canonical JSON serialization of the rendered
/// document, as a LaTeX comment. Keeps the data recoverable from the markup.
pub const RESUME_DATA_MARKER: &str = "% resume-data: ";

/// Escapes LaTeX reserved characters in user-controlled text.
/// Single pass, so escape sequences introduced for one character are never
/// re-escaped by another.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// Prepends `https://` to URL-like fields that lack a scheme. The visible
/// text elsewhere keeps the user's original string; only the hyperlink
/// target is normalized.
pub fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!("https://{url}")
}

/// GPA display rule: show when the value parses as a number >= 3.5, or when
/// it does not parse at all (a non-numeric annotation such as "Pass" is
/// displayed verbatim). Hidden otherwise.
fn gpa_should_show(gpa: &str) -> bool {
    let trimmed = gpa.trim();
    if trimmed.is_empty() {
        return false;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => value >= 3.5,
        Err(_) => true,
    }
}

fn join_non_empty(parts: &[String], sep: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(sep)
}

/// Renders a bullet list; blank or whitespace-only bullets are dropped
/// individually. An all-blank list renders to nothing.
fn format_itemize(items: &[String]) -> String {
    let cleaned: Vec<String> = items
        .iter()
        .filter(|item| !item.trim().is_empty())
        .map(|item| escape_latex(item))
        .collect();
    if cleaned.is_empty() {
        return String::new();
    }
    let mut lines = vec!["\\begin{itemize}".to_string()];
    lines.extend(cleaned.iter().map(|item| format!("    \\item {item}")));
    lines.push("\\end{itemize}".to_string());
    lines.join("\n")
}

/// Wraps a body in a section heading, or renders nothing when the body is
/// empty. This is what makes section omission hold per-section.
fn section(title: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    format!("\\section*{{{}}}\n{}\n", escape_latex(title), body)
}

fn href(target: &str, visible: &str) -> String {
    format!("\\href{{{}}}{{{}}}", target, escape_latex(visible))
}

fn render_header(resume: &Resume) -> String {
    let header = &resume.header;
    let mut contact_parts: Vec<String> = Vec::new();

    if !header.phone.is_empty() {
        contact_parts.push(escape_latex(&header.phone));
    }
    if !header.email.is_empty() {
        contact_parts.push(href(&format!("mailto:{}", header.email), &header.email));
    }
    for link in [&header.linkedin, &header.github, &header.portfolio] {
        if !link.is_empty() {
            contact_parts.push(href(&normalize_url(link), link));
        }
    }
    if !header.location.is_empty() {
        contact_parts.push(escape_latex(&header.location));
    }

    let contact_line = join_non_empty(&contact_parts, " \\quad ");
    let mut lines = vec!["\\begin{center}".to_string()];
    if !header.name.is_empty() {
        lines.push(format!(
            "    {{\\LARGE \\textbf{{{}}}}} \\\\",
            escape_latex(&header.name)
        ));
    }
    if !contact_line.is_empty() {
        lines.push(format!("    {contact_line}"));
    }
    lines.push("\\end{center}".to_string());
    lines.join("\n")
}

fn render_education(resume: &Resume) -> String {
    let mut entries = Vec::new();
    for edu in &resume.education {
        let school = escape_latex(edu.school.trim());
        let grad = escape_latex(edu.grad.trim());
        let degree_bits = join_non_empty(
            &[escape_latex(edu.degree.trim()), escape_latex(edu.major.trim())],
            " ",
        );

        let mut lines = Vec::new();
        let heading = join_non_empty(
            &[
                if school.is_empty() {
                    String::new()
                } else {
                    format!("\\textbf{{{school}}}")
                },
                if grad.is_empty() {
                    String::new()
                } else {
                    format!("\\hfill {grad}")
                },
            ],
            " ",
        );
        if !heading.is_empty() {
            lines.push(format!("{heading} \\\\"));
        }
        if !degree_bits.is_empty() {
            lines.push(format!("{degree_bits} \\\\"));
        }
        let coursework = edu
            .coursework
            .iter()
            .filter(|cw| !cw.trim().is_empty())
            .map(|cw| escape_latex(cw))
            .collect::<Vec<_>>()
            .join(", ");
        if !coursework.is_empty() {
            lines.push(format!("\\textbf{{Coursework:}} {coursework}"));
        }
        if gpa_should_show(&edu.gpa) {
            lines.push(format!("GPA: {}", escape_latex(edu.gpa.trim())));
        }
        if !lines.is_empty() {
            entries.push(lines.join("\n"));
        }
    }
    section("Education", &entries.join("\n\n"))
}

fn render_experience(resume: &Resume) -> String {
    let mut entries = Vec::new();
    for role in &resume.experience {
        let company = escape_latex(role.company.trim());
        let location = escape_latex(role.location.trim());
        let date_range = join_non_empty(
            &[escape_latex(role.start.trim()), escape_latex(role.end.trim())],
            " -- ",
        );

        let mut left_bits = Vec::new();
        if !company.is_empty() {
            left_bits.push(format!("\\textbf{{{company}}}"));
        }
        if !location.is_empty() {
            left_bits.push(format!("\\textit{{{location}}}"));
        }
        let heading = join_non_empty(
            &[
                left_bits.join(" "),
                if date_range.is_empty() {
                    String::new()
                } else {
                    format!("\\hfill {date_range}")
                },
            ],
            " ",
        );

        let mut parts = Vec::new();
        if !heading.is_empty() {
            parts.push(format!("{heading} \\\\"));
        }
        let role_line = escape_latex(role.role.trim());
        if !role_line.is_empty() {
            parts.push(role_line);
        }
        let bullets = format_itemize(&role.bullets);
        if !bullets.is_empty() {
            parts.push(bullets);
        }
        if !parts.is_empty() {
            entries.push(parts.join("\n"));
        }
    }
    section("Work Experience", &entries.join("\n\n"))
}

fn render_projects(resume: &Resume) -> String {
    let mut entries = Vec::new();
    for project in &resume.projects {
        let name = escape_latex(project.name.trim());
        let mut heading = if name.is_empty() {
            String::new()
        } else {
            format!("\\textbf{{{name}}}")
        };
        if !project.link.trim().is_empty() {
            let link = project.link.trim();
            heading = join_non_empty(
                &[heading, href(&normalize_url(link), link)],
                " \\textemdash{} ",
            );
        }
        let date_range = join_non_empty(
            &[
                escape_latex(project.start.trim()),
                escape_latex(project.end.trim()),
            ],
            " -- ",
        );
        if !date_range.is_empty() {
            heading = join_non_empty(&[heading, format!("\\hfill {date_range}")], " ");
        }

        let mut parts = Vec::new();
        if !heading.is_empty() {
            parts.push(format!("{heading} \\\\"));
        }
        let stack = project
            .stack
            .iter()
            .filter(|item| !item.trim().is_empty())
            .map(|item| escape_latex(item))
            .collect::<Vec<_>>()
            .join(", ");
        if !stack.is_empty() {
            parts.push(format!("\\textit{{Stack:}} {stack}"));
        }
        let bullets = format_itemize(&project.bullets);
        if !bullets.is_empty() {
            parts.push(bullets);
        }
        if !parts.is_empty() {
            entries.push(parts.join("\n"));
        }
    }
    section("Projects", &entries.join("\n\n"))
}

fn render_skill_line(label: &str, items: &[String]) -> String {
    let joined = items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| escape_latex(s))
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        return String::new();
    }
    format!("\\textbf{{{}:}} {}", escape_latex(label), joined)
}

fn render_skills(resume: &Resume) -> String {
    let skills = &resume.skills;
    if skills.is_empty() {
        return String::new();
    }
    let mut lines = Vec::new();
    for (label, items) in [
        ("Programming Languages", &skills.languages),
        ("Frameworks", &skills.frameworks),
        ("Tools", &skills.tools),
        ("Concepts", &skills.concepts),
    ] {
        let line = render_skill_line(label, items);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    // Free-form named groups follow the fixed categories, in name order.
    for (name, items) in &skills.groups {
        let line = render_skill_line(name, items);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    section("Skills", &lines.join(" \\\\\n"))
}

fn render_leadership(resume: &Resume) -> String {
    let mut entries = Vec::new();
    for leader in &resume.leadership {
        let org = escape_latex(leader.org.trim());
        let date_range = join_non_empty(
            &[
                escape_latex(leader.start.trim()),
                escape_latex(leader.end.trim()),
            ],
            " -- ",
        );
        let heading = join_non_empty(
            &[
                if org.is_empty() {
                    String::new()
                } else {
                    format!("\\textbf{{{org}}}")
                },
                if date_range.is_empty() {
                    String::new()
                } else {
                    format!("\\hfill {date_range}")
                },
            ],
            " ",
        );

        let mut parts = Vec::new();
        if !heading.is_empty() {
            parts.push(format!("{heading} \\\\"));
        }
        let title = escape_latex(leader.title.trim());
        if !title.is_empty() {
            parts.push(title);
        }
        let bullets = format_itemize(&leader.bullets);
        if !bullets.is_empty() {
            parts.push(bullets);
        }
        if !parts.is_empty() {
            entries.push(parts.join("\n"));
        }
    }
    section("Leadership Experience", &entries.join("\n\n"))
}

fn render_awards(resume: &Resume) -> String {
    section("Awards", &format_itemize(&resume.awards))
}

fn render_data_comment(resume: &Resume) -> Result<String> {
    let json = serde_json::to_string(resume)
        .map_err(|e| anyhow!("Failed to serialize resume for data comment: {e}"))?;
    Ok(format!("{RESUME_DATA_MARKER}{json}"))
}

/// Renders the document into the template by substituting the named
/// placeholder tokens. Pure string work; the template is supplied by the
/// caller (see `template::load_template`).
pub fn render_resume(resume: &Resume, template_tex: &str) -> Result<String> {
    let replacements = [
        ("{{HEADER_BLOCK}}", render_header(resume)),
        ("{{EDUCATION_BLOCK}}", render_education(resume)),
        ("{{EXPERIENCE_BLOCK}}", render_experience(resume)),
        ("{{PROJECTS_BLOCK}}", render_projects(resume)),
        ("{{SKILLS_BLOCK}}", render_skills(resume)),
        ("{{LEADERSHIP_BLOCK}}", render_leadership(resume)),
        ("{{AWARDS_BLOCK}}", render_awards(resume)),
        ("{{RESUME_DATA_BLOCK}}", render_data_comment(resume)?),
    ];

    let mut rendered = template_tex.to_string();
    for (token, value) in &replacements {
        rendered = rendered.replace(token, value.trim());
    }
    Ok(rendered)
}

/// Recovers the document from the data comment embedded in rendered output.
pub fn extract_embedded_resume(tex: &str) -> Result<Resume> {
    let line = tex
        .lines()
        .find_map(|l| l.trim().strip_prefix(RESUME_DATA_MARKER.trim_end()))
        .ok_or_else(|| anyhow!("No resume data comment found in rendered output"))?;
    Ok(serde_json::from_str(line.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationEntry, ProjectEntry, Resume, RoleEntry};

    const TEST_TEMPLATE: &str = "\\documentclass{article}\n\\begin{document}\n{{HEADER_BLOCK}}\n{{EDUCATION_BLOCK}}\n{{EXPERIENCE_BLOCK}}\n{{PROJECTS_BLOCK}}\n{{SKILLS_BLOCK}}\n{{LEADERSHIP_BLOCK}}\n{{AWARDS_BLOCK}}\n{{RESUME_DATA_BLOCK}}\n\\end{document}\n";

    fn sample_resume() -> Resume {
        let mut resume = Resume::default();
        resume.header.name = "Ada Lovelace".to_string();
        resume.header.email = "ada@example.com".to_string();
        resume.header.github = "github.com/ada".to_string();
        resume.education.push(EducationEntry {
            school: "University of London".to_string(),
            degree: "B.S.".to_string(),
            major: "Mathematics".to_string(),
            grad: "1840".to_string(),
            gpa: "3.9".to_string(),
            coursework: vec!["Analysis".to_string()],
        });
        resume.experience.push(RoleEntry {
            company: "Analytical Engines & Co".to_string(),
            role: "Programmer".to_string(),
            start: "1842".to_string(),
            end: "1843".to_string(),
            bullets: vec![
                "Wrote the first published program".to_string(),
                "   ".to_string(),
            ],
            ..Default::default()
        });
        resume.skills.languages = vec!["Ada".to_string()];
        resume
    }

    #[test]
    fn test_escape_latex_reserved_characters() {
        assert_eq!(escape_latex("50% & $10"), "50\\% \\& \\$10");
        assert_eq!(escape_latex("a_b#c"), "a\\_b\\#c");
        assert_eq!(escape_latex("{x}"), "\\{x\\}");
        assert_eq!(escape_latex("~^"), "\\textasciitilde{}\\textasciicircum{}");
    }

    #[test]
    fn test_escape_latex_backslash_not_double_escaped() {
        assert_eq!(escape_latex("a\\b"), "a\\textbackslash{}b");
        // The braces introduced by the backslash escape stay intact.
        assert_eq!(escape_latex("\\{"), "\\textbackslash{}\\{");
    }

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("github.com/ada"), "https://github.com/ada");
        assert_eq!(normalize_url("https://a.dev"), "https://a.dev");
        assert_eq!(normalize_url("http://a.dev"), "http://a.dev");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_header_link_keeps_visible_text_verbatim() {
        let resume = sample_resume();
        let header = render_header(&resume);
        assert!(header.contains("\\href{https://github.com/ada}{github.com/ada}"));
    }

    #[test]
    fn test_gpa_threshold_rule() {
        assert!(!gpa_should_show("3.2"));
        assert!(gpa_should_show("3.5"));
        assert!(gpa_should_show("3.9"));
        assert!(gpa_should_show("Pass"));
        assert!(!gpa_should_show(""));
        assert!(!gpa_should_show("  "));
    }

    #[test]
    fn test_low_gpa_is_omitted_from_output() {
        let mut resume = sample_resume();
        resume.education[0].gpa = "3.2".to_string();
        let out = render_education(&resume);
        assert!(!out.contains("GPA"));

        resume.education[0].gpa = "Pass".to_string();
        let out = render_education(&resume);
        assert!(out.contains("GPA: Pass"));
    }

    #[test]
    fn test_empty_education_omits_heading_entirely() {
        let mut resume = sample_resume();
        resume.education.clear();
        let rendered = render_resume(&resume, TEST_TEMPLATE).unwrap();
        assert!(!rendered.contains("Education"));
        // Other sections are unaffected.
        assert!(rendered.contains("Work Experience"));
    }

    #[test]
    fn test_all_blank_entries_count_as_empty_section() {
        let mut resume = Resume::default();
        resume.education.push(EducationEntry::default());
        resume.awards = vec!["  ".to_string(), String::new()];
        assert_eq!(render_education(&resume), "");
        assert_eq!(render_awards(&resume), "");
    }

    #[test]
    fn test_blank_bullets_dropped_individually() {
        let resume = sample_resume();
        let out = render_experience(&resume);
        assert!(out.contains("\\item Wrote the first published program"));
        assert_eq!(out.matches("\\item").count(), 1);
        assert!(out.contains("\\begin{itemize}"));
    }

    #[test]
    fn test_skills_renders_flat_categories_and_groups() {
        let mut resume = sample_resume();
        resume
            .skills
            .groups
            .insert("Databases".to_string(), vec!["Postgres".to_string()]);
        let out = render_skills(&resume);
        assert!(out.contains("\\textbf{Programming Languages:} Ada"));
        assert!(out.contains("\\textbf{Databases:} Postgres"));
    }

    #[test]
    fn test_project_link_target_normalized_text_verbatim() {
        let mut resume = Resume::default();
        resume.projects.push(ProjectEntry {
            name: "Atlas".to_string(),
            link: "atlas.dev".to_string(),
            ..Default::default()
        });
        let out = render_projects(&resume);
        assert!(out.contains("\\href{https://atlas.dev}{atlas.dev}"));
    }

    #[test]
    fn test_render_leaves_no_placeholders_behind() {
        let rendered = render_resume(&sample_resume(), TEST_TEMPLATE).unwrap();
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_embedded_data_round_trips_document() {
        let resume = sample_resume();
        let rendered = render_resume(&resume, TEST_TEMPLATE).unwrap();
        let recovered = extract_embedded_resume(&rendered).unwrap();
        assert_eq!(recovered, resume);
    }

    #[test]
    fn test_extract_embedded_resume_missing_comment_fails() {
        assert!(extract_embedded_resume("\\documentclass{article}").is_err());
    }
}
