use crate::helpers::{TestApp, BOT_TOKEN};

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/", test_app.address);
    let response = client
        .get(url)
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "Bot server is running");
    // Neither the document store nor Telegram are consulted.
    assert!(test_app.store_server.received_requests().await.unwrap().is_empty());
    assert!(test_app.telegram_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn debug_env_does_not_reveal_secrets() {
    let test_app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/debug-env", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    let report: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(report["webAppUrl"], "https://lists.example.com/");
    assert_eq!(report["botToken"], "SET (hidden)");
    assert_eq!(report["firebaseConfigSet"], true);
    assert!(!body.contains(BOT_TOKEN));
    assert!(!body.contains("api-key"));
}

#[tokio::test]
async fn debug_env_reports_a_missing_web_app_url() {
    let test_app = TestApp::spawn_app_with(|config| config.web_app.url = String::new()).await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/debug-env", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);

    let report: serde_json::Value = response.json().await.unwrap();

    assert_eq!(report["webAppUrl"], "NOT SET");
}

#[tokio::test]
async fn notify_accepts_cross_origin_requests() {
    let test_app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/notify", test_app.address),
        )
        .header("Origin", "https://lists.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("https://lists.example.com")
    );
}
