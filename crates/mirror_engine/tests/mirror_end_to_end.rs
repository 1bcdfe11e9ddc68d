use std::time::Duration;

use mirror_core::{Ledger, PublishGate};
use mirror_engine::{ClientSettings, PageOutcome, Poller, SyncSettings, TokenResolver};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_BASE: &str = "https://files.example.com/img/posts";

fn hello_page() -> Value {
    json!({
        "object": "page",
        "id": "p1",
        "last_edited_time": "2024-03-01T10:00:00.000Z",
        "properties": {
            "Name": {"type": "title", "title": [{"plain_text": "Hello World"}]},
            "Status": {"type": "select", "select": {"name": "online"}},
            "Description": {"type": "rich_text", "rich_text": [{"plain_text": "First post"}]},
            "Release": {"type": "date", "date": {"start": "2024-03-01", "end": null}},
        }
    })
}

async fn mount_store(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .and(header("Authorization", "Bearer secret_from_file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [hello_page()],
            "has_more": false,
            "next_cursor": null,
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/pages/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_page()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/p1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "b1", "type": "paragraph", "has_children": false,
                 "paragraph": {"rich_text": [{"plain_text": "Welcome."}]}},
                {"id": "b2", "type": "paragraph", "has_children": false,
                 "paragraph": {"rich_text": []}},
                {"id": "b3", "type": "image", "has_children": false,
                 "image": {"type": "file", "file": {"url": format!("{}/files/photo.png?sig=1", server.uri())}}},
            ],
            "has_more": false,
            "next_cursor": null,
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"png-bytes".to_vec(), "image/png"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn mirrors_published_page_with_self_hosted_image() {
    mirror_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_store(&server).await;

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("notion-mirror.yaml");
    std::fs::write(&config, "token: secret_from_file\n").unwrap();
    let settings = SyncSettings {
        database_id: "db1".into(),
        output_dir: dir.path().join("out"),
        image_base_dir: dir.path().join("img"),
        public_image_base_url: PUBLIC_BASE.into(),
        poll_interval: Duration::from_millis(10),
        gate: PublishGate::default(),
        client: ClientSettings {
            base_url: server.uri(),
            ..ClientSettings::default()
        },
    };
    let tokens = TokenResolver::new("MIRROR_E2E_TOKEN_UNSET", Some(config));
    let poller = Poller::notion(settings, tokens).unwrap();
    let mut ledger = Ledger::new();

    let report = poller.run_cycle(&mut ledger).await.unwrap();

    let output = dir.path().join("out").join("hello-world.md");
    assert_eq!(
        report.pages[0].outcome,
        PageOutcome::Rendered {
            path: output.clone()
        }
    );

    let images: Vec<_> = std::fs::read_dir(dir.path().join("img").join("hello-world"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(images.len(), 1);
    let image_name = images[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(image_name.ends_with("-photo.png"), "{image_name}");
    assert_eq!(std::fs::read(&images[0]).unwrap(), b"png-bytes");

    let doc = std::fs::read_to_string(&output).unwrap();
    assert!(doc.starts_with("---\ntitle: Hello World\n"), "{doc}");
    assert!(doc.contains("description: First post\n"), "{doc}");
    assert!(doc.contains("2024-03-01"), "{doc}");
    assert!(doc.contains("---\n\n# Hello World\n\nWelcome.\n\n"), "{doc}");
    let public = format!("{PUBLIC_BASE}/hello-world/{image_name}");
    assert!(doc.ends_with(&format!("![{public}]({public})\n")), "{doc}");

    // Unchanged on the next poll: nothing fetched beyond the query.
    let report = poller.run_cycle(&mut ledger).await.unwrap();
    assert_eq!(report.attempted(), 0);
}
