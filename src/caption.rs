//! Prompt construction and parsing of the model's reply.
//!
//! The model is asked for three labelled lines. Vision models follow that format only
//! loosely, so parsing accepts bullets, numbering, markdown emphasis, quotes, and a
//! label whose value sits on the next line. Anything unlabeled before the first label
//! becomes the description when no explicit description is present.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescription {
    pub headline: Option<String>,
    pub description: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Headline,
    Description,
    Keywords,
}

const LABELS: &[(&str, Section)] = &[
    ("image headline", Section::Headline),
    ("headline", Section::Headline),
    ("title", Section::Headline),
    ("image description", Section::Description),
    ("description", Section::Description),
    ("caption", Section::Description),
    ("image keywords", Section::Keywords),
    ("keywords", Section::Keywords),
    ("tags", Section::Keywords),
];

/// Build the fixed instruction sent along with every image.
///
/// `tone` is a comma separated list such as `"witty, curious"`.
pub fn build_prompt(tone: &str, keyword_count: u32) -> String {
    format!(
        "As a photojournalist, analyze the following image and describe it in a {} tone.\n\
         Answer with exactly three lines:\n\
         Image Headline: a short, impactful title\n\
         Image Description: a brief, informative summary\n\
         Image Keywords: {} keywords, separated by commas",
        describe_tone(tone),
        keyword_count
    )
}

fn describe_tone(tone: &str) -> String {
    let tones: Vec<&str> = tone
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    match tones.as_slice() {
        [] => "neutral".to_string(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

impl ImageDescription {
    /// Parse a model reply. Returns `None` when no description text can be recovered.
    pub fn parse(text: &str) -> Option<Self> {
        let mut headline: Option<String> = None;
        let mut description_parts: Vec<String> = Vec::new();
        let mut keyword_parts: Vec<String> = Vec::new();
        let mut unlabeled: Vec<String> = Vec::new();
        let mut current: Option<Section> = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (section, value) = match split_label(line) {
                Some((section, rest)) => {
                    current = Some(section);
                    (Some(section), clean_value(rest))
                }
                None => (current, clean_value(strip_bullet(line))),
            };

            if value.is_empty() {
                continue;
            }

            match section {
                Some(Section::Headline) if headline.is_none() => headline = Some(value),
                // A headline is one line; anything after it continues the description.
                Some(Section::Headline) | Some(Section::Description) => {
                    description_parts.push(value)
                }
                Some(Section::Keywords) => keyword_parts.push(value),
                None => unlabeled.push(value),
            }
        }

        let description = if description_parts.is_empty() {
            unlabeled.join(" ")
        } else {
            description_parts.join(" ")
        };

        if description.is_empty() {
            return None;
        }

        Some(Self {
            headline,
            description,
            keywords: split_keywords(&keyword_parts),
        })
    }
}

fn split_label(line: &str) -> Option<(Section, &str)> {
    let candidate = line.trim_start_matches(|c: char| {
        c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '*' | '#' | '.' | ')' | '•')
    });
    let (label, rest) = candidate.split_once(':')?;
    let label = label.trim().trim_matches('*').trim().to_ascii_lowercase();

    LABELS
        .iter()
        .find(|(name, _)| {
            label
                .strip_prefix(name)
                .is_some_and(is_label_qualifier)
        })
        .map(|(_, section)| (*section, rest))
}

/// What may follow a label name before the colon: nothing, a count such as `(5)`,
/// or an echo of the instruction (`, separated by commas`).
fn is_label_qualifier(tail: &str) -> bool {
    let tail = tail.trim_start_matches([',', ' ']);
    tail.is_empty()
        || tail.starts_with('(')
        || tail.starts_with("separated by")
        || tail.starts_with("comma separated")
        || tail.starts_with("comma-separated")
}

fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(['-', '*', '•']).trim_start()
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '*' | '“' | '”'))
        .trim()
        .to_string()
}

fn split_keywords(parts: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for keyword in parts.iter().flat_map(|part| part.split(',')) {
        let keyword = clean_value(keyword.trim().trim_end_matches('.'));
        if keyword.is_empty() {
            continue;
        }
        if !keywords.iter().any(|k| k.eq_ignore_ascii_case(&keyword)) {
            keywords.push(keyword);
        }
    }

    keywords
}
