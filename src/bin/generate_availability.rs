use chrono::Utc;
use clap::Parser;
use glow_atelier::domain::model::AvailabilityFeed;
use glow_atelier::domain::ports::Storage;
use glow_atelier::utils::{logger, validation::Validate};
use glow_atelier::{AppConfig, LocalStorage, Result};

#[derive(Parser)]
#[command(name = "generate-availability")]
#[command(about = "Write the availability feed served in \"file\" mode")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "glow-atelier.toml")]
    config: String,

    /// Output file, defaults to availability.file_path or availability.json
    #[arg(short, long)]
    output: Option<String>,

    /// Override availability.days_ahead
    #[arg(long)]
    days: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: Args) -> Result<String> {
    tracing::info!("📁 Loading configuration from: {}", args.config);
    let config = AppConfig::from_file(&args.config)?;
    config.validate()?;

    let mut plan = config.slot_plan()?;
    if let Some(days) = args.days {
        plan.days_ahead = days.clamp(1, 60);
        tracing::info!("🔧 Days ahead overridden to: {}", plan.days_ahead);
    }

    let now = Utc::now();
    let feed = AvailabilityFeed {
        generated_at: now,
        timezone: config.timezone_name().to_string(),
        days: plan.generate(now),
    };
    let slot_count: usize = feed.days.iter().map(|d| d.slots.len()).sum();

    let output = args.output.unwrap_or_else(|| {
        config
            .availability
            .as_ref()
            .and_then(|a| a.file_path.clone())
            .unwrap_or_else(|| "availability.json".to_string())
    });
    let (storage, file_name) = LocalStorage::for_file(&output);
    let body = serde_json::to_vec_pretty(&feed)?;
    storage.write_file(&file_name, &body).await?;

    tracing::info!(
        "✅ Wrote {} days / {} slots to {}",
        feed.days.len(),
        slot_count,
        output
    );
    Ok(output)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    match run(args).await {
        Ok(output) => println!("✅ Availability feed written to {}", output),
        Err(e) => {
            tracing::error!(
                "❌ Feed generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    }
}
