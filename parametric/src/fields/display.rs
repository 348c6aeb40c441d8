use super::{FieldDisplayNormalizer, FieldPath};

/// Title-cases every word of a field name: `grassy field` becomes
/// `Grassy Field`, `PUBLISHED_YEAR` becomes `Published Year`.
/// Values are displayed as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleCaseNormalizer;

impl TitleCaseNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl FieldDisplayNormalizer for TitleCaseNormalizer {
    fn display_name(&self, field: &FieldPath) -> String {
        title_case(field.as_str())
    }
}

/// Upper-case the first character of each word and lower-case the rest.
/// Underscores separate words like whitespace does.
pub fn title_case(input: &str) -> String {
    input
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
