use list_notifier::config::get_configuration;
use list_notifier::startup::{build_bot_service, Application};
use list_notifier::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(
        String::from("list_notifier"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let application = Application::build(config.clone()).await?;

    tracing::info!("Server running on port {}", application.get_port());

    if !config.telegram.has_bot_token() {
        tracing::warn!("No bot token configured, only the HTTP server is running");
        return application.run_until_stop().await;
    }

    let bot = match build_bot_service(&config).await {
        Ok(bot) => bot,
        Err(err) => {
            tracing::error!("Bot is disabled, only the HTTP server is running: {}", err);
            return application.run_until_stop().await;
        }
    };

    // The HTTP server stops on SIGINT/SIGTERM, which also ends the bot polling loop.
    tokio::select! {
        result = application.run_until_stop() => result,
        _ = bot.run_until_stopped() => Ok(()),
    }
}
