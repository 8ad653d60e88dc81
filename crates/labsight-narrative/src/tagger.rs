//! Doctor-type tagging of free-form narrative text.

use labsight_core::Vocabulary;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Sentinel returned when no specialist is mentioned.
pub const NO_DOCTOR_TYPE: &str = "No doctor type found";

/// Whole-word, case-insensitive matcher over the doctor-type vocabulary.
pub struct DoctorTypeTagger {
    patterns: Vec<(String, Regex)>,
}

impl DoctorTypeTagger {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let patterns = vocabulary
            .doctor_types
            .iter()
            .filter_map(|name| {
                let pattern = format!(r"\b{}\b", regex::escape(name));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => Some((name.clone(), re)),
                    Err(e) => {
                        warn!("Skipping doctor type {:?}: {}", name, e);
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Vocabulary entries mentioned in `text`, in vocabulary order.
    pub fn tag(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Comma-joined tag list, or the sentinel when empty.
    pub fn render(tags: &[String]) -> String {
        if tags.is_empty() {
            NO_DOCTOR_TYPE.to_string()
        } else {
            tags.join(", ")
        }
    }

    /// `tag` followed by `render`.
    pub fn describe(&self, text: &str) -> String {
        Self::render(&self.tag(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger() -> DoctorTypeTagger {
        DoctorTypeTagger::new(&Vocabulary::default())
    }

    #[test]
    fn test_vocabulary_order_and_case() {
        let text = "Please see a NEUROLOGIST soon, or a cardiologist if pain persists.";
        let tags = tagger().tag(text);
        let cardio = tags.iter().position(|t| t == "Cardiologist");
        let neuro = tags.iter().position(|t| t == "Neurologist");
        assert!(cardio.is_some() && neuro.is_some());
        assert!(cardio < neuro);
    }

    #[test]
    fn test_whole_word_only() {
        let vocab = Vocabulary::new(vec![], vec![], vec![], vec!["Urologist".into()]);
        let tagger = DoctorTypeTagger::new(&vocab);
        assert!(tagger.tag("neurologists and urologists").is_empty());
        assert_eq!(tagger.tag("See a urologist."), vec!["Urologist"]);
    }

    #[test]
    fn test_sentinel_when_none() {
        assert_eq!(tagger().describe("Drink water and rest."), NO_DOCTOR_TYPE);
    }

    #[test]
    fn test_render_joins() {
        let tags = vec!["Dentist".to_string(), "Urologist".to_string()];
        assert_eq!(DoctorTypeTagger::render(&tags), "Dentist, Urologist");
    }
}
