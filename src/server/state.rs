use crate::adapters::resend::ResendMailer;
use crate::adapters::square::{SquareAvailability, SquareClient};
use crate::config::cli::LocalStorage;
use crate::config::toml_config::{AppConfig, AvailabilityMode};
use crate::core::availability::{FileAvailability, StaticAvailability};
use crate::core::booking::{BookingEngine, Sender};
use crate::core::catalog::Catalog;
use crate::core::rate_limiter::SlidingWindowLimiter;
use crate::core::render::{render_landing, LandingContext};
use crate::domain::ports::AvailabilitySource;
use crate::utils::error::Result;
use chrono_tz::Tz;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<Catalog>,
    /// 目錄在啟動後不會變，首頁只渲染一次
    pub landing_html: Arc<String>,
    pub engine: Arc<BookingEngine>,
    pub availability: Option<Arc<dyn AvailabilitySource>>,
    pub timezone: Tz,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let timezone = config.timezone()?;
        let catalog = Arc::new(config.catalog());

        let square = match config.payments() {
            Some(payments) => Some(Arc::new(SquareClient::new(payments)?)),
            None => None,
        };

        let mut engine = BookingEngine::new(catalog.clone(), config.site.name.clone(), timezone);
        if let (Some(client), Some(deposit)) = (&square, config.deposit()) {
            tracing::info!("💳 Square deposits enabled ({})", deposit);
            engine = engine.with_payments(client.clone(), deposit);
        }
        if let Some(email) = config.email() {
            tracing::info!(
                "📧 Confirmation emails enabled ({} per {:?} per recipient)",
                email.rate_limit_max(),
                email.rate_limit_window()
            );
            let limiter = Arc::new(SlidingWindowLimiter::new(
                email.rate_limit_max(),
                email.rate_limit_window(),
            ));
            let sender = Sender {
                from: email.from.clone(),
                reply_to: email.reply_to.clone(),
            };
            engine = engine.with_mailer(Arc::new(ResendMailer::new(email)?), sender, limiter);
        }

        let availability: Option<Arc<dyn AvailabilitySource>> = match config.availability_mode() {
            AvailabilityMode::Static => Some(Arc::new(StaticAvailability::new(config.slot_plan()?))),
            AvailabilityMode::File => {
                let path = config
                    .availability
                    .as_ref()
                    .and_then(|a| a.file_path.as_deref())
                    .unwrap_or("availability.json");
                let (storage, file_name) = LocalStorage::for_file(path);
                Some(Arc::new(FileAvailability::new(storage, file_name)))
            }
            AvailabilityMode::Square => match &square {
                Some(client) => Some(Arc::new(SquareAvailability::new(
                    client.clone(),
                    catalog.clone(),
                    config
                        .availability
                        .as_ref()
                        .and_then(|a| a.service_variation_id.clone()),
                    timezone,
                ))),
                None => {
                    tracing::warn!("Square availability requested but payments are disabled");
                    None
                }
            },
            AvailabilityMode::Disabled => None,
        };
        tracing::info!("🗓️ Availability mode: {:?}", config.availability_mode());

        let landing = LandingContext {
            site_name: config.site.name.clone(),
            tagline: config.site.tagline.clone(),
            phone: config.site.phone.clone(),
            address: config.site.address.clone(),
            deposit: engine.deposit().cloned(),
            availability_enabled: availability.is_some(),
        };
        let landing_html = Arc::new(render_landing(&landing, &catalog));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            landing_html,
            engine: Arc::new(engine),
            availability,
            timezone,
        })
    }
}
