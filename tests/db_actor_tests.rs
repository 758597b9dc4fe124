use curation_schema::{Criteria, EntityKind, PageDefaults, PageRequest};
use oncokb_curation::db::{EntityPatch, EntityWrite};
use serde_json::{Map, Value, json};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "curation-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("json object")
}

fn write(kind: EntityKind, value: Value) -> EntityWrite {
    let mut write = EntityWrite::from_json(kind, &object(value)).expect("valid payload");
    write.fill_generated();
    write.check_required().expect("required fields present");
    write
}

#[tokio::test]
async fn db_actor_insert_find_patch_delete_baseline() {
    let temp_path = unique_sqlite_path("db-actor-baseline");
    let database_url = format!("sqlite:{}", temp_path.display());
    let db = oncokb_curation::db::spawn(&database_url)
        .await
        .expect("spawn db actor");

    db.ping().await.expect("ping");

    let flag_id = db
        .insert(write(
            EntityKind::Flag,
            json!({ "type": "DRUG", "flag": "FDA", "name": "FDA approved", "description": "-" }),
        ))
        .await
        .expect("insert flag");

    let drug_id = db
        .insert(write(
            EntityKind::Drug,
            json!({ "name": "Vemurafenib", "flags": [{ "id": flag_id }] }),
        ))
        .await
        .expect("insert drug");

    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    assert_eq!(drug["id"], json!(drug_id));
    assert_eq!(drug["name"], "Vemurafenib");
    assert!(
        drug["uuid"].as_str().is_some_and(|s| s.len() == 36),
        "uuid should be generated, got {}",
        drug["uuid"]
    );
    assert_eq!(drug["nciThesaurus"], Value::Null);
    assert_eq!(drug["flags"][0]["id"], json!(flag_id));
    assert_eq!(drug["flags"][0]["name"], "FDA approved");

    let patch = EntityPatch::from_json(
        EntityKind::Drug,
        drug_id,
        &object(json!({ "id": drug_id, "name": "Dabrafenib" })),
    )
    .expect("valid patch");
    assert!(db.patch(patch).await.expect("patch drug"));

    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    assert_eq!(drug["name"], "Dabrafenib");
    // Patching scalars leaves owned relations alone.
    assert_eq!(drug["flags"][0]["id"], json!(flag_id));

    let missing = EntityPatch::from_json(
        EntityKind::Drug,
        drug_id + 100,
        &object(json!({ "name": "Nobody" })),
    )
    .expect("valid patch");
    assert!(!db.patch(missing).await.expect("patch missing drug"));

    assert!(db.exists(EntityKind::Drug, drug_id).await.expect("exists"));
    assert_eq!(
        db.count(EntityKind::Drug, Criteria::default())
            .await
            .expect("count"),
        1
    );

    // Deleting the flag drops the association row, not the drug.
    assert!(db.delete(EntityKind::Flag, flag_id).await.expect("delete flag"));
    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    assert_eq!(drug["flags"], json!([]));

    assert!(db.delete(EntityKind::Drug, drug_id).await.expect("delete drug"));
    assert!(!db.delete(EntityKind::Drug, drug_id).await.expect("delete again"));
    assert!(
        db.find_one(EntityKind::Drug, drug_id)
            .await
            .expect("find deleted")
            .is_none()
    );

    let _ = std::fs::remove_file(&temp_path);
}

#[tokio::test]
async fn db_actor_replace_clears_absent_relations_and_nulls_foreign_keys() {
    let temp_path = unique_sqlite_path("db-actor-replace");
    let database_url = format!("sqlite:{}", temp_path.display());
    let db = oncokb_curation::db::spawn(&database_url)
        .await
        .expect("spawn db actor");

    let nci_id = db
        .insert(write(
            EntityKind::NciThesaurus,
            json!({ "version": "24.01", "code": "C64768", "displayName": "Vemurafenib" }),
        ))
        .await
        .expect("insert nci thesaurus");

    let mut flag_ids = Vec::new();
    for flag in ["FDA", "EMA"] {
        let id = db
            .insert(write(
                EntityKind::Flag,
                json!({ "type": "DRUG", "flag": flag, "name": flag, "description": "-" }),
            ))
            .await
            .expect("insert flag");
        flag_ids.push(id);
    }

    let drug_id = db
        .insert(write(
            EntityKind::Drug,
            json!({
                "name": "Vemurafenib",
                "nciThesaurus": { "id": nci_id },
                "flags": [{ "id": flag_ids[0] }, { "id": flag_ids[1] }],
            }),
        ))
        .await
        .expect("insert drug");

    let page = PageRequest::first(PageDefaults::default().default_size);
    let (rows, total) = db
        .find_page(EntityKind::Drug, Criteria::default(), page.clone(), false)
        .await
        .expect("find page");
    assert_eq!(total, 1);
    assert_eq!(rows[0]["nciThesaurus"], json!({ "id": nci_id }));
    assert_eq!(
        rows[0]["flags"],
        json!([{ "id": flag_ids[0] }, { "id": flag_ids[1] }])
    );

    // Removing the referenced row nulls the foreign key.
    assert!(db.delete(EntityKind::NciThesaurus, nci_id).await.expect("delete nci"));
    let (rows, _) = db
        .find_page(EntityKind::Drug, Criteria::default(), page, true)
        .await
        .expect("find page");
    assert_eq!(rows[0]["nciThesaurus"], Value::Null);

    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    let uuid = drug["uuid"].clone();

    // A replacement naming one flag keeps only that link.
    let narrowed = write(
        EntityKind::Drug,
        json!({ "id": drug_id, "uuid": uuid, "name": "Vemurafenib", "flags": [{ "id": flag_ids[1] }] }),
    );
    assert!(db.replace(drug_id, narrowed).await.expect("replace"));
    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    assert_eq!(drug["flags"].as_array().map(Vec::len), Some(1));
    assert_eq!(drug["flags"][0]["id"], json!(flag_ids[1]));

    // Omitting the relation clears it.
    let replacement = write(
        EntityKind::Drug,
        json!({ "id": drug_id, "uuid": uuid, "name": "Vemurafenib (renamed)" }),
    );
    assert!(db.replace(drug_id, replacement).await.expect("replace"));

    let drug = db
        .find_one(EntityKind::Drug, drug_id)
        .await
        .expect("find drug")
        .expect("drug exists");
    assert_eq!(drug["name"], "Vemurafenib (renamed)");
    assert_eq!(drug["uuid"], uuid);
    assert_eq!(drug["flags"], json!([]));

    let ghost = write(EntityKind::Drug, json!({ "name": "Ghost" }));
    assert!(!db.replace(drug_id + 100, ghost).await.expect("replace missing"));

    let _ = std::fs::remove_file(&temp_path);
}

#[tokio::test]
async fn db_actor_search_is_none_for_unsearchable_entities() {
    let temp_path = unique_sqlite_path("db-actor-search");
    let database_url = format!("sqlite:{}", temp_path.display());
    let db = oncokb_curation::db::spawn(&database_url)
        .await
        .expect("spawn db actor");

    let page = PageRequest::first(PageDefaults::default().default_size);
    let result = db
        .search(EntityKind::GenomeFragment, "exon".to_string(), page.clone())
        .await
        .expect("search");
    assert!(result.is_none());

    let (rows, total) = db
        .search(EntityKind::Gene, "braf".to_string(), page)
        .await
        .expect("search")
        .expect("gene is searchable");
    assert!(rows.is_empty());
    assert_eq!(total, 0);

    let _ = std::fs::remove_file(&temp_path);
}
