use list_notifier::bot::BotService;
use list_notifier::startup::build_bot_service;
use list_notifier::telegram::keyboard::ButtonStyle;
use list_notifier::telegram::types::Update;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{message_sent, TestApp};

async fn connect_bot(test_app: &TestApp) -> BotService {
    test_app.mount_get_me().await;

    Mock::given(path_regex(r"/sendMessage$"))
        .respond_with(message_sent())
        .mount(&test_app.telegram_server)
        .await;

    Mock::given(path_regex(r"/answerCallbackQuery$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true, "result": true })),
        )
        .mount(&test_app.telegram_server)
        .await;

    build_bot_service(&test_app.config)
        .await
        .expect("Failed to connect the bot.")
}

fn start_update(text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "from": { "id": 42, "is_bot": false, "first_name": "Ada", "username": "ada" },
            "chat": { "id": 42, "type": "private" },
            "date": 1714550400,
            "text": text
        }
    }))
    .unwrap()
}

fn callback_update(data: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": 2,
        "callback_query": {
            "id": "callback-1",
            "from": { "id": 42, "is_bot": false, "first_name": "Ada" },
            "message": {
                "message_id": 11,
                "chat": { "id": 42, "type": "private" },
                "date": 1714550400
            },
            "chat_instance": "instance",
            "data": data
        }
    }))
    .unwrap()
}

fn list_query_result(date: &str, item_count: usize) -> serde_json::Value {
    let items: Vec<serde_json::Value> = (0..item_count)
        .map(|i| {
            serde_json::json!({
                "referenceValue": format!("projects/lists-project/databases/(default)/documents/items/item-{}", i)
            })
        })
        .collect();

    serde_json::json!([{
        "document": {
            "name": "projects/lists-project/databases/(default)/documents/lists/list-1",
            "fields": {
                "date": { "stringValue": date },
                "createdAt": { "timestampValue": "2024-05-01T08:00:00Z" },
                "items": { "arrayValue": { "values": items } }
            }
        },
        "readTime": "2024-05-02T00:00:00Z"
    }])
}

#[tokio::test]
async fn bot_caches_its_username_when_connecting() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    assert_eq!(bot.bot_username(), "lists_bot");
}

#[tokio::test]
async fn start_command_stores_the_subscriber_and_offers_the_recent_list() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:commit", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_query_result("2024-05-01", 3)))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&start_update("/start")).await;

    let texts = test_app.sent_texts().await;

    assert_eq!(
        texts,
        vec![
            "✅ You're subscribed! You'll be notified for new domain lists.",
            "📌 Open Manager is pinned below the message field.",
            "Use the buttons below to open the list manager:",
            "📋 View List (2024-05-01)",
        ]
    );

    let keyboard = &test_app.sent_messages().await[1]["reply_markup"];

    assert_eq!(
        *keyboard,
        serde_json::json!({
            "keyboard": [[{ "text": "Open Manager", "web_app": { "url": "https://lists.example.com/" } }]],
            "resize_keyboard": true
        })
    );
}

#[tokio::test]
async fn start_command_with_url_buttons_sends_no_web_app_keyboard() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.telegram.button_style = ButtonStyle::Url;
    })
    .await;
    let bot = connect_bot(&test_app).await;

    Mock::given(path(format!("{}:commit", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&test_app.store_server)
        .await;

    Mock::given(path(format!("{}:runQuery", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_query_result("2024-05-01", 3)))
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&start_update("/start")).await;

    let messages = test_app.sent_messages().await;

    assert_eq!(messages.len(), 3);
    assert!(messages
        .iter()
        .all(|message| message["reply_markup"].get("keyboard").is_none()));
    assert_eq!(
        messages[2]["reply_markup"]["inline_keyboard"][0][0]["url"],
        "https://lists.example.com/?date=2024-05-01"
    );
}

#[tokio::test]
async fn start_command_without_lists_says_so() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    Mock::given(path(format!("{}:commit", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&test_app.store_server)
        .await;

    Mock::given(path(format!("{}:runQuery", test_app.documents_path())))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "readTime": "2024-05-02T00:00:00Z" }])),
        )
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&start_update("/start")).await;

    let texts = test_app.sent_texts().await;

    assert_eq!(texts.last().map(String::as_str), Some("No recent lists found."));
}

#[tokio::test]
async fn start_command_reports_store_failures_to_the_user() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    Mock::given(path(format!("{}:commit", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&start_update("/start")).await;

    assert_eq!(
        test_app.sent_texts().await,
        vec!["Sorry, there was an error processing your request."]
    );
}

#[tokio::test]
async fn commands_addressed_to_other_bots_are_ignored() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    bot.handle_update(&start_update("/start@other_bot")).await;

    assert!(test_app.store_server.received_requests().await.unwrap().is_empty());
    assert!(test_app.sent_texts().await.is_empty());
}

#[tokio::test]
async fn view_list_callback_shows_the_first_ten_items() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;
    let found: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            serde_json::json!({ "found": {
                "name": format!("projects/lists-project/databases/(default)/documents/items/item-{}", i),
                "fields": { "name": { "stringValue": format!("domain-{}.com", i) } }
            } })
        })
        .collect();

    Mock::given(path(format!("{}:runQuery", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_query_result("2024-05-01", 12)))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    Mock::given(path(format!("{}:batchGet", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(found)))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&callback_update("list:2024-05-01")).await;

    let texts = test_app.sent_texts().await;

    assert_eq!(texts.len(), 1);

    let lines: Vec<&str> = texts[0].lines().collect();

    assert_eq!(lines.first(), Some(&"📋 List (2024-05-01)"));
    assert_eq!(lines.len(), 12);
    assert_eq!(lines.last(), Some(&"+2 more"));
}

#[tokio::test]
async fn status_callback_for_unknown_user_invites_to_subscribe() {
    let test_app = TestApp::spawn_app().await;
    let bot = connect_bot(&test_app).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/subscribers/42", test_app.documents_path())))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    bot.handle_update(&callback_update("status")).await;

    assert_eq!(
        test_app.sent_texts().await,
        vec!["You're not subscribed yet. Send /start to subscribe."]
    );

    let answered = test_app
        .telegram_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().ends_with("/answerCallbackQuery"))
        .count();

    assert_eq!(answered, 1);
}
