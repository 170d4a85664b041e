mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{person_body, TestOptions, TestServer};
use crm_persons_api::database::PersonStore;

#[tokio::test]
async fn delete_removes_person_and_notifies() -> Result<()> {
    let server = TestServer::spawn().await?;
    let created = server.create_person(&server.admin(), &person_body("Ann", "ann@example.com")).await?;
    let id = created["id"].as_i64().unwrap();
    server.recorder.clear();

    let res = server
        .client
        .delete(server.url(&format!("/api/contacts/persons/{}", id)))
        .bearer_auth(server.admin())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({ "message": "Person deleted successfully." }));

    assert_eq!(
        server.recorder.events(),
        vec![
            ("contacts.person.delete.before".to_string(), Some(id)),
            ("contacts.person.delete.after".to_string(), Some(id)),
        ]
    );
    assert!(server.store.inner.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn delete_unknown_id_is_404_without_events() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .delete(server.url("/api/contacts/persons/77"))
        .bearer_auth(server.admin())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.recorder.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_delete_is_500_with_failure_message() -> Result<()> {
    let server = TestServer::spawn().await?;
    let created = server.create_person(&server.admin(), &person_body("Ann", "ann@example.com")).await?;
    let id = created["id"].as_i64().unwrap();
    server.recorder.clear();
    server.store.fail_deletes.store(true, Ordering::SeqCst);

    let res = server
        .client
        .delete(server.url(&format!("/api/contacts/persons/{}", id)))
        .bearer_auth(server.admin())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await?, json!({ "message": "Person could not be deleted." }));

    assert_eq!(server.recorder.channels(), vec!["contacts.person.delete.before"]);
    assert_eq!(server.store.inner.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn failed_delete_can_use_legacy_wording() -> Result<()> {
    let server = TestServer::spawn_with(TestOptions {
        legacy_delete_failure_message: true,
        ..Default::default()
    })
    .await?;
    let created = server.create_person(&server.admin(), &person_body("Ann", "ann@example.com")).await?;
    server.store.fail_deletes.store(true, Ordering::SeqCst);

    let res = server
        .client
        .delete(server.url(&format!("/api/contacts/persons/{}", created["id"])))
        .bearer_auth(server.admin())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await?["message"], "Person deleted successfully.");
    Ok(())
}

#[tokio::test]
async fn mass_destroy_skips_missing_ids() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin();
    let a = server.create_person(&token, &person_body("Ann", "ann@example.com")).await?["id"].as_i64().unwrap();
    let b = server.create_person(&token, &person_body("Bob", "bob@example.com")).await?["id"].as_i64().unwrap();
    let c = server.create_person(&token, &person_body("Cid", "cid@example.com")).await?["id"].as_i64().unwrap();
    server.recorder.clear();

    let res = server
        .client
        .post(server.url("/api/contacts/persons/mass-destroy"))
        .bearer_auth(&token)
        .json(&json!({ "indices": [a, 999, c] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "message": "Selected persons deleted successfully." })
    );

    assert_eq!(
        server.recorder.events(),
        vec![
            ("contact.person.delete.before".to_string(), Some(a)),
            ("contact.person.delete.after".to_string(), Some(a)),
            ("contact.person.delete.before".to_string(), Some(c)),
            ("contact.person.delete.after".to_string(), Some(c)),
        ]
    );
    assert_eq!(server.store.inner.len().await, 1);
    assert!(server.store.inner.find(b).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn mass_destroy_succeeds_even_when_deletes_fail() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin();
    let a = server.create_person(&token, &person_body("Ann", "ann@example.com")).await?["id"].as_i64().unwrap();
    server.recorder.clear();
    server.store.fail_deletes.store(true, Ordering::SeqCst);

    let res = server
        .client
        .post(server.url("/api/contacts/persons/mass-destroy"))
        .bearer_auth(&token)
        .json(&json!({ "indices": [a] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.recorder.channels(), vec!["contact.person.delete.before"]);
    Ok(())
}
