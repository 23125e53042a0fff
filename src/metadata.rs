use crate::caption::ImageDescription;

pub const HEADLINE_FIELDS: &[&str] = &["IPTC:Headline", "XMP-dc:Title"];
pub const DESCRIPTION_FIELDS: &[&str] = &[
    "IPTC:Caption-Abstract",
    "EXIF:UserComment",
    "XMP-dc:Description",
];
pub const KEYWORD_FIELDS: &[&str] = &["IPTC:Keywords", "XMP-dc:Subject"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    /// List-type tags such as keywords; each item becomes its own assignment.
    List(Vec<String>),
}

/// A single `GROUP:Tag` assignment in the image's metadata container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTag {
    pub field: String,
    pub value: TagValue,
}

impl MetadataTag {
    pub fn new(field: impl Into<String>, value: TagValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TagValue::Text(text) => Some(text),
            TagValue::List(_) => None,
        }
    }

    pub fn is_iptc(&self) -> bool {
        self.field
            .split_once(':')
            .is_some_and(|(group, _)| group.eq_ignore_ascii_case("IPTC"))
    }
}

/// Map a parsed description onto the caption, title, and keyword fields.
///
/// The headline and keyword tags are omitted when the model did not provide them,
/// so existing values in the file are left untouched.
pub fn description_tags(description: &ImageDescription) -> Vec<MetadataTag> {
    let mut tags = Vec::with_capacity(
        HEADLINE_FIELDS.len() + DESCRIPTION_FIELDS.len() + KEYWORD_FIELDS.len(),
    );

    if let Some(headline) = &description.headline {
        tags.extend(
            HEADLINE_FIELDS
                .iter()
                .map(|field| MetadataTag::new(*field, TagValue::Text(headline.clone()))),
        );
    }

    tags.extend(DESCRIPTION_FIELDS.iter().map(|field| {
        MetadataTag::new(*field, TagValue::Text(description.description.clone()))
    }));

    if !description.keywords.is_empty() {
        tags.extend(
            KEYWORD_FIELDS
                .iter()
                .map(|field| MetadataTag::new(*field, TagValue::List(description.keywords.clone()))),
        );
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_only() {
        let description = ImageDescription {
            headline: None,
            description: "a red bicycle".to_string(),
            keywords: vec![],
        };

        let tags = description_tags(&description);
        assert_eq!(tags.len(), DESCRIPTION_FIELDS.len());
        assert!(tags.iter().all(|t| t.text() == Some("a red bicycle")));
    }

    #[test]
    fn test_full_mapping() {
        let description = ImageDescription {
            headline: Some("Wheels of Fortune".to_string()),
            description: "A red bicycle leans on a wall.".to_string(),
            keywords: vec!["bicycle".to_string(), "red".to_string()],
        };

        let tags = description_tags(&description);
        assert_eq!(tags.len(), 7);

        let title = tags.iter().find(|t| t.field == "XMP-dc:Title").unwrap();
        assert_eq!(title.text(), Some("Wheels of Fortune"));

        let keywords = tags.iter().find(|t| t.field == "IPTC:Keywords").unwrap();
        assert_eq!(
            keywords.value,
            TagValue::List(vec!["bicycle".to_string(), "red".to_string()])
        );
    }

    #[test]
    fn test_iptc_group_detection() {
        assert!(MetadataTag::new("IPTC:Keywords", TagValue::List(vec![])).is_iptc());
        assert!(!MetadataTag::new("XMP-dc:Subject", TagValue::List(vec![])).is_iptc());
        assert!(!MetadataTag::new("Comment", TagValue::Text(String::new())).is_iptc());
    }
}
