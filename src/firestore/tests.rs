use super::models::{json_to_wire, wire_to_json, FieldValue, FilterOp, OrderDirection};
use super::*;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DOCUMENTS_ROOT: &str = "/v1/projects/test-project/databases/(default)/documents";

fn firestore_against(server: &MockServer) -> FirebaseFirestore {
    let client = ClientBuilder::new(Client::new()).build();
    FirebaseFirestore::new_with_client(client, server.url(DOCUMENTS_ROOT))
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Comp {
    name: String,
    tier: String,
    pick_count: i64,
    win_rate: f64,
}

fn comp_fields() -> serde_json::Value {
    json!({
        "name": {"stringValue": "Reroll Snipers"},
        "tier": {"stringValue": "S"},
        "pick_count": {"integerValue": "42"},
        "win_rate": {"doubleValue": 0.23}
    })
}

#[tokio::test]
async fn test_get_document_as_struct() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("{}/comps/reroll-snipers", DOCUMENTS_ROOT));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/comps/reroll-snipers",
                "fields": comp_fields(),
                "createTime": "2026-01-01T00:00:00Z",
                "updateTime": "2026-01-02T00:00:00Z"
            }));
    });

    let comp: Comp = db.doc("comps/reroll-snipers").unwrap().get().await.unwrap();
    assert_eq!(
        comp,
        Comp {
            name: "Reroll Snipers".to_string(),
            tier: "S".to_string(),
            pick_count: 42,
            win_rate: 0.23,
        }
    );

    mock.assert();
}

#[tokio::test]
async fn test_get_missing_document_is_not_found() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    server.mock(|when, then| {
        when.method(GET)
            .path(format!("{}/comps/ghost", DOCUMENTS_ROOT));
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
            }));
    });

    let err = db
        .doc("comps/ghost")
        .unwrap()
        .get::<Comp>()
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::NotFound(_)));
}

#[tokio::test]
async fn test_set_document_writes_wire_fields() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path(format!("{}/comps/reroll-snipers", DOCUMENTS_ROOT))
            .header("content-type", "application/json")
            .json_body(json!({"fields": comp_fields()}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/comps/reroll-snipers",
                "fields": comp_fields()
            }));
    });

    let comp = Comp {
        name: "Reroll Snipers".to_string(),
        tier: "S".to_string(),
        pick_count: 42,
        win_rate: 0.23,
    };
    let written = db
        .doc("comps/reroll-snipers")
        .unwrap()
        .set(&comp)
        .await
        .unwrap();
    assert_eq!(written.id(), "reroll-snipers");

    mock.assert();
}

#[tokio::test]
async fn test_update_sends_mask_and_existence_precondition() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path(format!("{}/comps/reroll-snipers", DOCUMENTS_ROOT))
            .query_param("currentDocument.exists", "true")
            .query_param("updateMask.fieldPaths", "tier")
            .json_body(json!({
                "fields": {"tier": {"stringValue": "A"}}
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/comps/reroll-snipers",
                "fields": {"tier": {"stringValue": "A"}}
            }));
    });

    #[derive(Serialize)]
    struct TierPatch {
        tier: String,
    }

    db.doc("comps/reroll-snipers")
        .unwrap()
        .update(
            &TierPatch {
                tier: "A".to_string(),
            },
            &["tier"],
        )
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_delete_document() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path(format!("{}/comps/reroll-snipers", DOCUMENTS_ROOT));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({}));
    });

    db.doc("comps/reroll-snipers").unwrap().delete().await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_add_returns_server_assigned_id() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}/comps", DOCUMENTS_ROOT))
            .json_body(json!({"fields": comp_fields()}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/comps/Xy12abCD",
                "fields": comp_fields()
            }));
    });

    let comp = Comp {
        name: "Reroll Snipers".to_string(),
        tier: "S".to_string(),
        pick_count: 42,
        win_rate: 0.23,
    };
    let created = db.collection("comps").unwrap().add(&comp).await.unwrap();
    assert_eq!(created.id(), "Xy12abCD");

    mock.assert();
}

#[tokio::test]
async fn test_list_passes_pagination_token_through() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("{}/comps", DOCUMENTS_ROOT))
            .query_param("pageSize", "2")
            .query_param("pageToken", "page-2");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "documents": [
                    {
                        "name": "projects/test-project/databases/(default)/documents/comps/a",
                        "fields": comp_fields()
                    }
                ],
                "nextPageToken": "page-3"
            }));
    });

    let page = db
        .collection("comps")
        .unwrap()
        .list(2, Some("page-2"))
        .await
        .unwrap();
    assert_eq!(page.documents.len(), 1);
    assert_eq!(page.next_page_token.as_deref(), Some("page-3"));

    mock.assert();
}

#[tokio::test]
async fn test_query_builds_composite_filter() {
    let server = MockServer::start();
    let db = firestore_against(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}:runQuery", DOCUMENTS_ROOT))
            .json_body(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "comps"}],
                    "where": {
                        "compositeFilter": {
                            "op": "AND",
                            "filters": [
                                {
                                    "fieldFilter": {
                                        "field": {"fieldPath": "tier"},
                                        "op": "EQUAL",
                                        "value": {"stringValue": "S"}
                                    }
                                },
                                {
                                    "fieldFilter": {
                                        "field": {"fieldPath": "pick_count"},
                                        "op": "GREATER_THAN",
                                        "value": {"integerValue": "10"}
                                    }
                                }
                            ]
                        }
                    },
                    "orderBy": [
                        {"field": {"fieldPath": "win_rate"}, "direction": "DESCENDING"}
                    ],
                    "limit": 5
                }
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {
                    "document": {
                        "name": "projects/test-project/databases/(default)/documents/comps/a",
                        "fields": comp_fields()
                    },
                    "readTime": "2026-01-02T00:00:00Z"
                },
                {"readTime": "2026-01-02T00:00:00Z"}
            ]));
    });

    let documents = db
        .query("comps")
        .unwrap()
        .filter("tier", FilterOp::Equal, "S")
        .filter("pick_count", FilterOp::GreaterThan, 10)
        .order_by("win_rate", OrderDirection::Descending)
        .limit(5)
        .run()
        .await
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id(), "a");

    mock.assert();
}

#[test]
fn test_path_validation() {
    let client = ClientBuilder::new(Client::new()).build();
    let db = FirebaseFirestore::new_with_client(client, "http://unused".to_string());

    assert!(matches!(
        db.doc("comps"),
        Err(FirestoreError::InvalidPath(_))
    ));
    assert!(matches!(
        db.doc("comps//nested"),
        Err(FirestoreError::InvalidPath(_))
    ));
    assert!(matches!(db.collection(""), Err(FirestoreError::InvalidPath(_))));
    assert!(matches!(
        db.collection("a/b"),
        Err(FirestoreError::InvalidPath(_))
    ));
    assert!(db.doc("comps/reroll-snipers/units/sniper-1").is_ok());
}

#[test]
fn test_value_conversion_covers_nested_shapes() {
    let original = json!({
        "title": "patch 14.2 notes",
        "live": true,
        "rank": 3,
        "score": 0.5,
        "tags": ["meta", "reroll"],
        "nested": {"inner": null}
    });

    let wire = json_to_wire(original.clone()).unwrap();
    match &wire {
        FieldValue::Map(map) => {
            assert!(matches!(
                map.fields.get("rank"),
                Some(FieldValue::Integer(s)) if s == "3"
            ));
        }
        other => panic!("expected map, got {other:?}"),
    }

    assert_eq!(wire_to_json(wire).unwrap(), original);
}
