use clap::Parser;
use restaurant_bot::utils::logger;
use restaurant_bot::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    logger::init_logger(args.verbose, args.log_format);

    tracing::info!("🚀 Starting restaurant-bot");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let result = match args.load_config() {
        Ok(config) => restaurant_bot::core::bot::run(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Bot stopped: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        // Anything that ends the service is a failure for the container runtime
        std::process::exit(e.exit_code().max(1));
    }

    tracing::info!("👋 restaurant-bot stopped");
    Ok(())
}
