//! Success alerts from the server, translated and written to stderr.

use std::io::Write;
use std::sync::Mutex;

use issuetrack_core::{AlertSink, BundledTranslations, CoreError, Translations};

/// Translation parts alert keys live in.
const ALERT_PARTS: &[&str] = &["issue", "global"];

pub struct CliAlerts<W> {
    translations: Translations,
    out: Mutex<W>,
}

impl CliAlerts<std::io::Stderr> {
    pub fn stderr(language: &str) -> Result<Self, CoreError> {
        Self::new(language, std::io::stderr())
    }
}

impl<W: Write> CliAlerts<W> {
    pub fn new(language: &str, out: W) -> Result<Self, CoreError> {
        let mut translations = Translations::new(language);
        for part in ALERT_PARTS {
            translations.add_part(part);
        }
        translations.refresh(&BundledTranslations)?;
        Ok(Self {
            translations,
            out: Mutex::new(out),
        })
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> AlertSink for CliAlerts<W> {
    fn success(&self, key: &str, param: Option<&str>) {
        let message = self.translations.translate(key, param);
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = writeln!(out, "✓ {message}");
    }
}
