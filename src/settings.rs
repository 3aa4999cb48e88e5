//! Editor settings, stored as TOML in the platform config directory.
//!
//! Settings only seed a new session (invoice defaults, the sender profile) and
//! configure printing. Invoices themselves are never written here.

use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SettingsError;
use crate::model::{Currency, InvoiceMeta, Party};
use crate::print::DEFAULT_PRINT_DELAY;
use crate::store::InvoiceStore;

const CONFIG_FILENAME: &str = "settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub invoice: InvoiceDefaults,
    pub sender: Party,
    pub print: PrintSettings,
}

impl Settings {
    /// Store for a new invoice: the invoice defaults, the sender profile and the
    /// sample rows.
    pub fn starting_store(&self) -> InvoiceStore {
        InvoiceStore::seeded(self.invoice.to_meta(), self.sender.clone())
    }
}

/// Values a fresh invoice starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceDefaults {
    pub number: String,
    pub currency: Currency,
    pub tax_rate_percent: f64,
    pub notes: String,
    pub payment_method: String,
    pub bank_details: String,
}

impl Default for InvoiceDefaults {
    fn default() -> Self {
        let meta = InvoiceMeta::default();
        InvoiceDefaults {
            number: meta.number,
            currency: meta.currency,
            tax_rate_percent: meta.tax_rate_percent,
            notes: meta.notes,
            payment_method: meta.payment_method,
            bank_details: meta.bank_details,
        }
    }
}

impl InvoiceDefaults {
    /// Metadata for a new invoice issued today.
    pub fn to_meta(&self) -> InvoiceMeta {
        InvoiceMeta {
            number: self.number.clone(),
            currency: self.currency,
            tax_rate_percent: self.tax_rate_percent,
            notes: self.notes.clone(),
            payment_method: self.payment_method.clone(),
            bank_details: self.bank_details.clone(),
            ..InvoiceMeta::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Where `.typ` and `.pdf` files are written. `~` expands to the home directory.
    pub output_dir: Option<String>,
    pub delay_ms: u64,
    pub open_after_print: bool,
    /// Optional Tera template replacing the built-in invoice layout.
    pub template: Option<PathBuf>,
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            output_dir: None,
            delay_ms: DEFAULT_PRINT_DELAY.as_millis() as u64,
            open_after_print: true,
            template: None,
        }
    }
}

impl PrintSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Configured output directory, or `Documents/Invoices` under the user's home.
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return expand_home_dir(dir);
        }
        UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Invoices")
    }
}

pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "invoice-editor", "app")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads settings, falling back to defaults when the file is missing or invalid.
pub fn load_settings() -> Settings {
    let Some(path) = settings_path() else {
        tracing::warn!("Could not determine settings path, using defaults");
        return Settings::default();
    };
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}, using defaults", path, e);
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            Settings::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}, using defaults", path, e);
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf, SettingsError> {
    let path = settings_path().ok_or(SettingsError::NoConfigDir)?;
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(settings)?;
    fs::write(path, content).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}

/// Expands a leading `~` or `~/` to the home directory. `~user` forms are
/// left alone.
pub fn expand_home_dir(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => Some(""),
        Some(rest) => rest.strip_prefix(['/', '\\']),
        None => None,
    };
    match (rest, BaseDirs::new()) {
        (Some(""), Some(dirs)) => dirs.home_dir().to_path_buf(),
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.invoice.currency = Currency::Eur;
        settings.invoice.tax_rate_percent = 21.0;
        settings.sender.name = "nd. studio".to_string();
        settings.print.output_dir = Some("~/Facturas".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[invoice]\ncurrency = \"MXN\"\n").unwrap();
        let settings = load_settings_from(&path);
        assert_eq!(settings.invoice.currency, Currency::Mxn);
        assert_eq!(settings.invoice.tax_rate_percent, 16.0);
        assert_eq!(settings.print.delay_ms, 300);
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(load_settings_from(&missing), Settings::default());

        let broken = dir.path().join(CONFIG_FILENAME);
        fs::write(&broken, "invoice = [").unwrap();
        assert_eq!(load_settings_from(&broken), Settings::default());
    }

    #[test]
    fn defaults_seed_invoice_meta() {
        let defaults = InvoiceDefaults {
            number: "2024-09".to_string(),
            currency: Currency::Mxn,
            tax_rate_percent: 8.0,
            ..InvoiceDefaults::default()
        };
        let meta = defaults.to_meta();
        assert_eq!(meta.number, "2024-09");
        assert_eq!(meta.currency, Currency::Mxn);
        assert_eq!(meta.tax_rate_percent, 8.0);
        assert!(meta.issue_date.is_some());
        assert_eq!(meta.due_date, None);
    }

    #[test]
    fn starting_store_uses_defaults_and_sender() {
        let mut settings = Settings::default();
        settings.invoice.number = "F-100".to_string();
        settings.sender.email = "hola@nd.studio".to_string();
        let store = settings.starting_store();
        assert_eq!(store.meta().number, "F-100");
        assert_eq!(store.party(crate::model::PartyRole::Sender).email, "hola@nd.studio");
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn explicit_output_dir_wins() {
        let print = PrintSettings {
            output_dir: Some("/tmp/invoices".to_string()),
            ..PrintSettings::default()
        };
        assert_eq!(print.resolved_output_dir(), PathBuf::from("/tmp/invoices"));
    }

    #[test]
    fn paths_without_tilde_are_untouched() {
        assert_eq!(expand_home_dir("/srv/data"), PathBuf::from("/srv/data"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(dirs) = BaseDirs::new() else {
            return;
        };
        let home = dirs.home_dir();
        assert_eq!(expand_home_dir("~"), home.to_path_buf());
        assert_eq!(expand_home_dir("~/Facturas"), home.join("Facturas"));
    }

    #[test]
    fn other_users_home_is_not_rewritten() {
        assert_eq!(expand_home_dir("~ana/Facturas"), PathBuf::from("~ana/Facturas"));
    }
}
