use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::bot::{BotService, BotSettings};
use crate::config::Settings;
use crate::document_store::FirestoreClient;
use crate::notifier::{AppNotifier, Notifier};
use crate::routes::{debug_env, handle_notify, health_check, json_error_handler, EnvironmentReport};
use crate::telegram::TelegramClient;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let notifier = build_notifier(&config)?;
        let environment_report = EnvironmentReport::from(&config);

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, notifier, environment_report)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    notifier: Option<AppNotifier>,
    environment_report: EnvironmentReport,
) -> Result<Server, std::io::Error> {
    let notifier = web::Data::new(notifier);
    let environment_report = web::Data::new(environment_report);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            // The list manager front-end calls the API straight from the browser
            .wrap(Cors::permissive())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/", web::get().to(health_check))
            .route("/notify", web::post().to(handle_notify))
            .route("/debug-env", web::get().to(debug_env))
            .app_data(notifier.clone())
            .app_data(environment_report.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Builds the notifier, or `None` when the web app url is missing or invalid. The server still
/// starts in that case so the configuration can be inspected through `/debug-env`.
pub fn build_notifier(config: &Settings) -> Result<Option<AppNotifier>, std::io::Error> {
    let web_app = match config.get_web_app_link() {
        Ok(web_app) => web_app,
        Err(err) => {
            tracing::warn!("Notifications are disabled: {}", err);
            return Ok(None);
        }
    };

    let notifier = Notifier::new(
        get_firestore_client(config)?,
        get_telegram_client(config)?,
        web_app,
        config.telegram.button_style,
    )
    .with_echo_errors(config.telegram.echo_errors);

    Ok(Some(notifier))
}

/// Connects the bot to Telegram. Fails when the bot token is rejected.
pub async fn build_bot_service(config: &Settings) -> Result<BotService, std::io::Error> {
    let settings = BotSettings {
        web_app: config
            .get_web_app_link()
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?,
        button_style: config.telegram.button_style,
        echo_errors: config.telegram.echo_errors,
        poll_timeout_secs: config.telegram.poll_timeout_secs,
    };

    BotService::connect(
        get_telegram_client(config)?,
        get_firestore_client(config)?,
        settings,
    )
    .await
    .map_err(|err| Error::new(ErrorKind::Other, err))
}

pub fn get_firestore_client(config: &Settings) -> Result<FirestoreClient, std::io::Error> {
    FirestoreClient::new(&config.firestore, None).map_err(|err| Error::new(ErrorKind::Other, err))
}

pub fn get_telegram_client(config: &Settings) -> Result<TelegramClient, std::io::Error> {
    TelegramClient::new(
        config.telegram.base_url.clone(),
        config.telegram.bot_token.clone(),
        None,
    )
    .map_err(|err| Error::new(ErrorKind::Other, err))
}
