//! The finished newsletter, split into its four sections

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::Trend;

/// Bullets required in the executive summary
pub const EXECUTIVE_SUMMARY_BULLETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ExecutiveSummary,
    Introduction,
    Body,
    Conclusion,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "executive summary",
            Self::Introduction => "introduction",
            Self::Body => "main body",
            Self::Conclusion => "conclusion",
        }
    }

    fn classify(title: &str) -> Option<Self> {
        let title = title.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| title.contains(w));

        let bare = title.trim_matches(|c: char| !c.is_alphanumeric());

        if has(&["executive", "key takeaways", "highlights", "tl;dr"]) {
            Some(Self::ExecutiveSummary)
        } else if bare == "summary" || has(&["conclusion", "final thoughts", "in summary"]) {
            Some(Self::Conclusion)
        } else if has(&["introduction", "intro", "overview", "big picture"]) {
            Some(Self::Introduction)
        } else if has(&["main", "analysis", "body", "deep dive", "news", "sentiment"]) {
            Some(Self::Body)
        } else if has(&["outlook", "prediction"]) {
            Some(Self::Conclusion)
        } else {
            None
        }
    }
}

/// Heading text and rank; bold and `Label:` lines rank below `######`
fn heading(line: &str) -> Option<(usize, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        let level = line.chars().take_while(|&c| c == '#').count();
        let title = line[level..].trim();
        return (!title.is_empty()).then_some((level, title));
    }
    let bold = line
        .strip_prefix("**")
        .and_then(|rest| rest.strip_suffix("**").or_else(|| rest.strip_suffix("**:")));
    if let Some(title) = bold {
        return (!title.contains("**")).then_some((10, title.trim().trim_end_matches(':')));
    }
    let label = line.strip_suffix(':')?;
    (label.len() <= 40 && Section::classify(label).is_some()).then_some((10, label))
}

fn bullet(line: &str) -> Option<&str> {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        return rest
            .strip_prefix(". ")
            .or_else(|| rest.strip_prefix(") "))
            .map(str::trim);
    }
    None
}

/// Direction from an explicit `Prediction:`-style line, else the first direction word
fn direction(conclusion: &str) -> Option<Trend> {
    conclusion
        .lines()
        .filter_map(|line| line.split_once(':'))
        .filter(|(label, _)| {
            let label = label.to_lowercase();
            ["prediction", "direction", "forecast", "trend", "outlook"]
                .iter()
                .any(|w| label.contains(w))
        })
        .find_map(|(_, value)| Trend::find_in(value))
        .or_else(|| Trend::find_in(conclusion))
}

/// A newsletter with exactly one of each section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Newsletter {
    pub title: Option<String>,
    pub executive_summary: Vec<String>,
    pub introduction: String,
    pub body: String,
    pub conclusion: String,
    /// Direction called in the conclusion
    pub direction: Trend,
    /// The newsletter as written
    pub markdown: String,
}

impl Newsletter {
    /// Split markdown into sections
    ///
    /// Section headings are the headings at the rank of the executive summary
    /// heading; deeper headings are content. An unrecognised heading right
    /// after the introduction starts the main body.
    pub fn parse(markdown: &str) -> Result<Self, ParseError> {
        let mut section_level: Option<usize> = None;
        let mut title = None;
        let mut seen: Vec<Section> = Vec::new();
        let mut current: Option<Section> = None;
        let mut contents: [Vec<&str>; 4] = Default::default();

        for line in markdown.lines() {
            if let Some((level, text)) = heading(line) {
                let section = Section::classify(text);

                // Headings before the executive summary are the title
                if section_level.is_none() {
                    if section == Some(Section::ExecutiveSummary) {
                        section_level = Some(level);
                    } else {
                        if title.is_none() {
                            title = Some(text.trim_matches('*').trim().to_string());
                        }
                        continue;
                    }
                }

                if section_level.is_some_and(|l| level <= l) {
                    let next = match section {
                        Some(section) => Some(section),
                        None if current == Some(Section::Introduction)
                            && !seen.contains(&Section::Body) =>
                        {
                            Some(Section::Body)
                        }
                        None => None,
                    };

                    if let Some(next) = next {
                        let continuing = current == Some(next);
                        if !continuing {
                            if seen.contains(&next) {
                                return Err(ParseError::DuplicateSection(next.name()));
                            }
                            seen.push(next);
                            current = Some(next);
                        }
                        if section.is_none() || continuing {
                            // Unnamed body headings and repeats of the open section are content
                            contents[next as usize].push(line);
                        }
                        continue;
                    }
                }
            }

            if let Some(section) = current {
                contents[section as usize].push(line);
            }
        }

        let text = |section: Section| contents[section as usize].join("\n").trim().to_string();
        let required = |section: Section| {
            let body = text(section);
            if body.is_empty() {
                Err(ParseError::MissingSection(section.name()))
            } else {
                Ok(body)
            }
        };

        if !seen.contains(&Section::ExecutiveSummary) {
            return Err(ParseError::MissingSection(Section::ExecutiveSummary.name()));
        }
        let executive_summary: Vec<String> = contents[Section::ExecutiveSummary as usize]
            .iter()
            .filter_map(|line| bullet(line))
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();
        if executive_summary.len() != EXECUTIVE_SUMMARY_BULLETS {
            return Err(ParseError::BulletCount {
                found: executive_summary.len(),
            });
        }

        let introduction = required(Section::Introduction)?;
        let body = required(Section::Body)?;
        let conclusion = required(Section::Conclusion)?;
        let direction = direction(&conclusion).ok_or(ParseError::MissingDirection)?;

        Ok(Self {
            title,
            executive_summary,
            introduction,
            body,
            conclusion,
            direction,
            markdown: markdown.trim().to_string(),
        })
    }
}
