use crate::core::catalog::{Catalog, CatalogOverrides};
use crate::core::slots::{parse_timezone, SlotPlan};
use crate::domain::money::Money;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SQUARE_BASE_URL: &str = "https://connect.squareup.com";
pub const DEFAULT_SQUARE_VERSION: &str = "2024-01-18";
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub catalog: CatalogOverrides,
    pub payments: Option<PaymentsConfig>,
    pub availability: Option<AvailabilityConfig>,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub tagline: Option<String>,
    pub timezone: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub access_token: String,
    pub application_id: Option<String>,
    pub location_id: String,
    pub deposit_cents: i64,
    pub currency: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityMode {
    Static,
    File,
    Square,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    pub mode: AvailabilityMode,
    pub days_ahead: Option<u32>,
    pub slot_minutes: Option<u32>,
    pub open: Option<String>,
    pub close: Option<String>,
    pub closed_weekdays: Option<Vec<String>>,
    pub file_path: Option<String>,
    /// 服務沒有對應 variation id 時使用的預設值
    pub service_variation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub api_key: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub rate_limit_max: Option<usize>,
    pub rate_limit_window_seconds: Option<u64>,
    pub timeout_seconds: Option<u64>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BookingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SQUARE_ACCESS_TOKEN})，未設定的保留原字串
    fn substitute_env_vars(content: &str) -> String {
        validation::placeholder_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("site.name", &self.site.name)?;
        self.timezone()?;

        if let Some(dir) = &self.server.static_dir {
            validation::validate_path("server.static_dir", dir)?;
        }

        if let Some(payments) = self.payments() {
            validation::validate_url("payments.base_url", payments.base_url())?;
            validation::validate_secret("payments.access_token", &payments.access_token)?;
            validation::validate_secret("payments.location_id", &payments.location_id)?;
            let application_id =
                validation::validate_required_field("payments.application_id", &payments.application_id)?;
            validation::validate_secret("payments.application_id", application_id)?;
            validation::validate_positive_number(
                "payments.deposit_cents",
                payments.deposit_cents.max(0) as u64,
                1,
            )?;
            if payments.currency().len() != 3 {
                return Err(BookingError::InvalidConfigValueError {
                    field: "payments.currency".to_string(),
                    value: payments.currency(),
                    reason: "Expected a three-letter ISO 4217 code".to_string(),
                });
            }
        }

        if let Some(availability) = &self.availability {
            match availability.mode {
                AvailabilityMode::Static => {
                    self.slot_plan()?;
                }
                AvailabilityMode::File => {
                    let path = validation::validate_required_field(
                        "availability.file_path",
                        &availability.file_path,
                    )?;
                    validation::validate_path("availability.file_path", path)?;
                    validation::validate_file_extension("availability.file_path", path, &["json"])?;
                }
                AvailabilityMode::Square => {
                    if self.payments().is_none() {
                        return Err(BookingError::MissingConfigError {
                            field: "payments (required by availability.mode = \"square\")".to_string(),
                        });
                    }
                }
                AvailabilityMode::Disabled => {}
            }
            validation::validate_range(
                "availability.days_ahead",
                availability.days_ahead(),
                1,
                60,
            )?;
        }

        if let Some(email) = self.email() {
            validation::validate_url("email.base_url", email.base_url())?;
            validation::validate_secret("email.api_key", &email.api_key)?;
            validation::validate_non_empty_string("email.from", &email.from)?;
            validation::validate_positive_number("email.rate_limit_max", email.rate_limit_max() as u64, 1)?;
            validation::validate_positive_number(
                "email.rate_limit_window_seconds",
                email.rate_limit_window().as_secs(),
                1,
            )?;
        }

        Ok(())
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(3000)
    }

    pub fn static_dir(&self) -> &str {
        self.server.static_dir.as_deref().unwrap_or("static")
    }

    pub fn timezone_name(&self) -> &str {
        self.site.timezone.as_deref().unwrap_or("America/Los_Angeles")
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(self.timezone_name())
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::glow_atelier().with_overrides(&self.catalog)
    }

    /// 只回傳啟用中的付款設定
    pub fn payments(&self) -> Option<&PaymentsConfig> {
        self.payments.as_ref().filter(|p| p.enabled.unwrap_or(true))
    }

    pub fn email(&self) -> Option<&EmailConfig> {
        self.email.as_ref().filter(|e| e.enabled.unwrap_or(true))
    }

    pub fn availability_mode(&self) -> AvailabilityMode {
        self.availability
            .as_ref()
            .map(|a| a.mode)
            .unwrap_or(AvailabilityMode::Disabled)
    }

    pub fn deposit(&self) -> Option<Money> {
        self.payments()
            .map(|p| Money::new(p.deposit_cents, p.currency()))
    }

    pub fn slot_plan(&self) -> Result<SlotPlan> {
        let defaults = AvailabilityConfig {
            mode: AvailabilityMode::Static,
            days_ahead: None,
            slot_minutes: None,
            open: None,
            close: None,
            closed_weekdays: None,
            file_path: None,
            service_variation_id: None,
        };
        let availability = self.availability.as_ref().unwrap_or(&defaults);

        let open = parse_clock("availability.open", availability.open.as_deref().unwrap_or("10:00"))?;
        let close = parse_clock("availability.close", availability.close.as_deref().unwrap_or("18:00"))?;
        if close <= open {
            return Err(BookingError::InvalidConfigValueError {
                field: "availability.close".to_string(),
                value: close.to_string(),
                reason: "Closing time must be after opening time".to_string(),
            });
        }

        let slot_minutes = availability.slot_minutes.unwrap_or(30);
        validation::validate_range("availability.slot_minutes", slot_minutes, 5, 480)?;

        let closed_weekdays = availability
            .closed_weekdays
            .clone()
            .unwrap_or_else(|| vec!["Sun".to_string()])
            .iter()
            .map(|day| {
                day.parse::<Weekday>()
                    .map_err(|_| BookingError::InvalidConfigValueError {
                        field: "availability.closed_weekdays".to_string(),
                        value: day.clone(),
                        reason: "Expected a weekday name such as \"Sun\" or \"monday\"".to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SlotPlan {
            timezone: self.timezone()?,
            open,
            close,
            slot_minutes,
            days_ahead: availability.days_ahead(),
            closed_weekdays,
        })
    }
}

fn parse_clock(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| BookingError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("Expected HH:MM ({})", e),
    })
}

impl PaymentsConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_SQUARE_BASE_URL)
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_SQUARE_VERSION)
    }

    pub fn currency(&self) -> String {
        self.currency.as_deref().unwrap_or("USD").to_uppercase()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(15))
    }
}

impl AvailabilityConfig {
    pub fn days_ahead(&self) -> u32 {
        self.days_ahead.unwrap_or(14)
    }
}

impl EmailConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_RESEND_BASE_URL)
    }

    pub fn rate_limit_max(&self) -> usize {
        self.rate_limit_max.unwrap_or(5)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds.unwrap_or(3600))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(10))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[server]
port = 8080

[site]
name = "Glow Atelier"
timezone = "America/Los_Angeles"

[payments]
base_url = "https://connect.squareupsandbox.com"
access_token = "sq-token"
application_id = "sandbox-sq0idb-app"
location_id = "L123"
deposit_cents = 5000

[availability]
mode = "static"
days_ahead = 7
open = "09:00"
close = "17:00"
closed_weekdays = ["Sun", "Mon"]

[email]
api_key = "re_test"
from = "Glow Atelier <bookings@glowatelier.com>"
rate_limit_max = 3
"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.site.name, "Glow Atelier");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.deposit(), Some(Money::usd(5000)));
        assert_eq!(config.availability_mode(), AvailabilityMode::Static);
        assert_eq!(config.email().unwrap().rate_limit_max(), 3);
        assert_eq!(config.email().unwrap().base_url(), DEFAULT_RESEND_BASE_URL);
        assert!(config.validate().is_ok());

        let plan = config.slot_plan().unwrap();
        assert_eq!(plan.days_ahead, 7);
        assert_eq!(plan.closed_weekdays, vec![Weekday::Sun, Weekday::Mon]);
    }

    #[test]
    fn test_minimal_config_has_no_features() {
        let config = AppConfig::from_toml_str("[site]\nname = \"Glow Atelier\"\n").unwrap();

        assert!(config.payments().is_none());
        assert!(config.email().is_none());
        assert_eq!(config.availability_mode(), AvailabilityMode::Disabled);
        assert_eq!(config.catalog().len(), 21);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_disabled_sections_are_ignored() {
        let content = FULL.replace("deposit_cents = 5000", "deposit_cents = 5000\nenabled = false");
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert!(config.payments().is_none());
        assert!(config.deposit().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GLOW_TEST_RESEND_KEY", "re_from_env");

        let content = FULL.replace("\"re_test\"", "\"${GLOW_TEST_RESEND_KEY}\"");
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.email.as_ref().unwrap().api_key, "re_from_env");

        std::env::remove_var("GLOW_TEST_RESEND_KEY");
    }

    #[test]
    fn test_unresolved_secret_fails_validation() {
        let content = FULL.replace("\"sq-token\"", "\"${GLOW_TEST_UNSET_SQUARE_TOKEN}\"");
        let config = AppConfig::from_toml_str(&content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(BookingError::MissingConfigError { field }) if field == "payments.access_token"
        ));
    }

    #[test]
    fn test_catalog_override_from_toml() {
        let content = r#"
[site]
name = "Glow Express"

[[catalog.peels]]
name = "Glycolic peel"
price = "$120"
duration = "30 min"
details = "Light resurfacing"
"#;
        let config = AppConfig::from_toml_str(content).unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.peels.len(), 1);
        assert_eq!(catalog.injectables.len(), 15);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_tz = FULL.replace("America/Los_Angeles", "Nowhere/City");
        assert!(AppConfig::from_toml_str(&bad_tz).unwrap().validate().is_err());

        let bad_hours = FULL.replace("close = \"17:00\"", "close = \"08:00\"");
        assert!(AppConfig::from_toml_str(&bad_hours).unwrap().validate().is_err());

        let bad_day = FULL.replace("\"Mon\"", "\"Funday\"");
        assert!(AppConfig::from_toml_str(&bad_day).unwrap().validate().is_err());

        let no_file = FULL.replace("mode = \"static\"", "mode = \"file\"");
        assert!(matches!(
            AppConfig::from_toml_str(&no_file).unwrap().validate(),
            Err(BookingError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_square_mode_requires_payments() {
        let content = r#"
[site]
name = "Glow Atelier"

[availability]
mode = "square"
"#;
        let config = AppConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.site.name, "Glow Atelier");
    }
}
