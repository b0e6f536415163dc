//! Fixtures for unit tests. Nothing here talks to a server.
#![allow(clippy::unwrap_used)]

use issuetrack_core::{BundledTranslations, ClientConfig, Translations};

/// Points at a port nothing listens on; tests never dispatch requests.
pub fn client_config() -> ClientConfig {
    ClientConfig::new(url::Url::parse("http://127.0.0.1:9/").unwrap())
}

/// Every translation part the issue views load.
pub fn translations() -> Translations {
    let mut translations = Translations::new("en");
    for part in ["issue", "state", "priority", "global"] {
        translations.add_part(part);
    }
    translations.refresh(&BundledTranslations).unwrap();
    translations
}
