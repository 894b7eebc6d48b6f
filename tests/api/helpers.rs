use reqwest::Response;
use secrecy::Secret;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use list_notifier::{
    config::{get_configuration, Settings},
    startup::Application,
};

pub const BOT_TOKEN: &str = "123456:test-token";

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub store_server: MockServer,
    pub telegram_server: MockServer,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        TestApp::spawn_app_with(|_| {}).await
    }

    /// Like [`TestApp::spawn_app`], letting the test adjust the configuration before the
    /// application is built.
    pub async fn spawn_app_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let store_server = MockServer::start().await;
        let telegram_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_firestore_base_url(store_server.uri());
        config.set_telegram_base_url(telegram_server.uri());
        config.firestore.api_key = Secret::new(String::from("api-key"));
        config.firestore.project_id = String::from("lists-project");
        config.telegram.bot_token = Secret::new(String::from(BOT_TOKEN));
        config.telegram.echo_errors = false;
        config.web_app.url = String::from("https://lists.example.com/");
        configure(&mut config);

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            store_server,
            telegram_server,
        }
    }

    pub async fn post_notify(&self, body: serde_json::Value) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/notify", self.address);

        client
            .post(&url)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn documents_path(&self) -> String {
        String::from("/v1/projects/lists-project/databases/(default)/documents")
    }

    pub async fn mount_subscribers(&self, user_ids: &[i64]) {
        let documents: Vec<serde_json::Value> = user_ids
            .iter()
            .map(|&user_id| subscriber_document(user_id))
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("{}/subscribers", self.documents_path())))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": documents })),
            )
            .named("List subscribers")
            .mount(&self.store_server)
            .await;
    }

    pub async fn mount_get_me(&self) {
        Mock::given(path(format!("/bot{}/getMe", BOT_TOKEN)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "id": 1, "is_bot": true, "first_name": "Lists", "username": "lists_bot" }
            })))
            .named("Bot identity")
            .mount(&self.telegram_server)
            .await;
    }

    /// Texts of every `sendMessage` call received so far, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent_messages()
            .await
            .iter()
            .filter_map(|body| body["text"].as_str().map(String::from))
            .collect()
    }

    pub async fn sent_messages(&self) -> Vec<serde_json::Value> {
        self.telegram_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path().ends_with("/sendMessage"))
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

pub fn subscriber_document(user_id: i64) -> serde_json::Value {
    serde_json::json!({
        "name": format!("projects/lists-project/databases/(default)/documents/subscribers/{}", user_id),
        "fields": {
            "userId": { "integerValue": user_id.to_string() },
            "username": { "stringValue": "" },
            "subscribedAt": { "timestampValue": "2024-05-01T10:00:00Z" }
        }
    })
}

pub fn message_sent() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "ok": true,
        "result": { "message_id": 1, "chat": { "id": 1, "type": "private" }, "date": 0 }
    }))
}
