// ── Translation catalog ──
//
// States declare which translation parts they need; the router loads any
// missing part before the state becomes active. Messages use
// `{{ name }}` placeholders.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::CoreError;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Flat `dotted.key -> message` map for one part.
pub type MessageMap = BTreeMap<String, String>;

/// Where translation parts come from.
pub trait TranslationSource: Send + Sync {
    fn load_part(&self, language: &str, part: &str) -> Result<MessageMap, CoreError>;
}

// ── Bundled parts ───────────────────────────────────────────────────

const BUNDLED_EN: &[(&str, &str)] = &[
    ("issue", include_str!("i18n/en/issue.toml")),
    ("state", include_str!("i18n/en/state.toml")),
    ("priority", include_str!("i18n/en/priority.toml")),
    ("global", include_str!("i18n/en/global.toml")),
];

/// Parts compiled into the binary (English only).
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledTranslations;

impl TranslationSource for BundledTranslations {
    fn load_part(&self, language: &str, part: &str) -> Result<MessageMap, CoreError> {
        let unavailable = |reason: String| CoreError::Translation {
            language: language.to_owned(),
            part: part.to_owned(),
            reason,
        };
        if language != DEFAULT_LANGUAGE {
            return Err(unavailable("language not bundled".into()));
        }
        let (_, raw) = BUNDLED_EN
            .iter()
            .find(|(name, _)| *name == part)
            .ok_or_else(|| unavailable("no such part".into()))?;
        parse_part(raw).map_err(|e| unavailable(e.to_string()))
    }
}

/// Parse a TOML document into flat dotted keys.
pub fn parse_part(raw: &str) -> Result<MessageMap, toml::de::Error> {
    let table: toml::Table = raw.parse()?;
    let mut messages = MessageMap::new();
    flatten("", &toml::Value::Table(table), &mut messages);
    Ok(messages)
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut MessageMap) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_owned(), s.clone());
        }
        other => {
            out.insert(prefix.to_owned(), other.to_string());
        }
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// Requested parts plus the messages loaded so far.
#[derive(Debug, Clone)]
pub struct Translations {
    language: String,
    requested: BTreeSet<String>,
    loaded: BTreeSet<String>,
    messages: MessageMap,
}

impl Default for Translations {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Translations {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            requested: BTreeSet::new(),
            loaded: BTreeSet::new(),
            messages: MessageMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn add_part(&mut self, part: &str) {
        self.requested.insert(part.to_owned());
    }

    pub fn is_loaded(&self, part: &str) -> bool {
        self.loaded.contains(part)
    }

    /// Load every requested part not loaded yet. Stops at the first failure;
    /// parts loaded before it stay loaded.
    pub fn refresh(&mut self, source: &dyn TranslationSource) -> Result<(), CoreError> {
        let missing: Vec<String> = self.requested.difference(&self.loaded).cloned().collect();
        for part in missing {
            let messages = source.load_part(&self.language, &part)?;
            debug!(part, count = messages.len(), "translation part loaded");
            self.messages.extend(messages);
            self.loaded.insert(part);
        }
        Ok(())
    }

    /// Message for `key` with `{{ param }}` substituted. Unknown keys are
    /// returned as-is.
    pub fn translate(&self, key: &str, param: Option<&str>) -> String {
        match param {
            Some(value) => self.translate_with(key, &[("param", value)]),
            None => self.translate_with(key, &[]),
        }
    }

    /// Message for `key` with each named `{{ name }}` placeholder substituted.
    pub fn translate_with(&self, key: &str, values: &[(&str, &str)]) -> String {
        let Some(template) = self.messages.get(key) else {
            return key.to_owned();
        };
        let mut message = template.clone();
        for (name, value) in values {
            message = message
                .replace(&format!("{{{{ {name} }}}}"), value)
                .replace(&format!("{{{{{name}}}}}"), value);
        }
        message
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FailingSource;

    impl TranslationSource for FailingSource {
        fn load_part(&self, language: &str, part: &str) -> Result<MessageMap, CoreError> {
            Err(CoreError::Translation {
                language: language.into(),
                part: part.into(),
                reason: "offline".into(),
            })
        }
    }

    #[test]
    fn bundled_parts_all_parse() {
        for (part, _) in BUNDLED_EN {
            let messages = BundledTranslations.load_part("en", part).unwrap();
            assert!(!messages.is_empty(), "part {part} is empty");
        }
    }

    #[test]
    fn alert_keys_translate_with_param() {
        let mut translations = Translations::default();
        translations.add_part("issue");
        translations.refresh(&BundledTranslations).unwrap();
        assert_eq!(
            translations.translate("issueTrackerApp.issue.created", Some("11")),
            "A new Issue is created with identifier 11"
        );
    }

    #[test]
    fn unknown_key_is_echoed() {
        let translations = Translations::default();
        assert_eq!(translations.translate("nope.key", None), "nope.key");
    }

    #[test]
    fn refresh_only_loads_missing_parts() {
        let mut translations = Translations::default();
        translations.add_part("global");
        translations.refresh(&BundledTranslations).unwrap();
        assert!(translations.is_loaded("global"));
        // Nothing new requested, so a failing source is never consulted.
        translations.refresh(&FailingSource).unwrap();
    }

    #[test]
    fn failed_part_is_reported() {
        let mut translations = Translations::default();
        translations.add_part("state");
        let err = translations.refresh(&FailingSource).unwrap_err();
        assert!(matches!(err, CoreError::Translation { ref part, .. } if part == "state"));
        assert!(!translations.is_loaded("state"));
    }

    #[test]
    fn unbundled_language_fails() {
        assert!(BundledTranslations.load_part("fr", "issue").is_err());
    }

    #[test]
    fn named_placeholders() {
        let mut translations = Translations::default();
        translations.add_part("issue");
        translations.refresh(&BundledTranslations).unwrap();
        assert_eq!(
            translations.translate_with("issueTrackerApp.issue.delete.question", &[("id", "7")]),
            "Are you sure you want to delete Issue 7?"
        );
    }
}
