mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{RecordingDriver, entries, new_log};
use serde_json::{Map, json};
use tempfile::tempdir;
use tokio::runtime::Runtime;
use websql_middleware::prelude::*;

#[test]
fn change_version_mismatch_keeps_the_stored_version() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let websql = WebSql::builder().build()?;
        let db = websql.open_database("versions", "1.0", "Versions", 0)?;

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        db.change_version(
            "0.9",
            "2.0",
            ChangeVersionCallbacks::new()
                .callback(|| panic!("must not run on a mismatch"))
                .on_error(move |err| sink.lock().unwrap().push(err)),
        )?;
        assert_eq!(db.version(), "1.0");
        let errors = errors.lock().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), SqlErrorCode::Version);
        assert_eq!(errors[0].code().as_u16(), 2);

        let bare = db.change_version("0.9", "2.0", ChangeVersionCallbacks::new());
        assert_eq!(bare.map_err(|err| err.code()), Err(SqlErrorCode::Version));

        let calls = Arc::new(Mutex::new(Vec::new()));
        let (on_change, on_success) = (Arc::clone(&calls), Arc::clone(&calls));
        db.change_version(
            "1.0",
            "2.0",
            ChangeVersionCallbacks::new()
                .callback(move || on_change.lock().unwrap().push("callback"))
                .on_success(move || on_success.lock().unwrap().push("success")),
        )?;
        assert_eq!(db.version(), "2.0");
        assert_eq!(*calls.lock().unwrap(), vec!["callback", "success"]);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn ready_times_out_without_a_driver() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let options = WebSqlOptionsBuilder::new()
            .ready_timeout(Duration::from_millis(60))
            .ready_poll_interval(Duration::from_millis(10))
            .finish();
        let websql = WebSql::builder().options(options).build()?;
        assert!(!websql.is_ready());
        assert!(matches!(
            websql.ready().await,
            Err(WebSqlError::ReadyTimeout(timeout)) if timeout == Duration::from_millis(60)
        ));

        let log = new_log();
        let installer = websql.clone();
        let install = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            installer.install_driver(Arc::new(RecordingDriver::new(&log)))
        });
        websql.ready().await?;
        install.await??;
        assert!(websql.is_ready());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn opens_are_merged_into_the_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("state").join("configs.json");
    let rt = Runtime::new()?;
    rt.block_on(async {
        let websql = WebSql::builder()
            .config_store(JsonFileStore::new(&path))
            .build()?;

        let created = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&created);
        websql.open_database_with_callback("mydb", "1.0", "Test DB", 1024, |db| {
            *slot.lock().unwrap() = Some(db.name().to_string());
        })?;
        assert_eq!(created.lock().unwrap().as_deref(), Some("mydb"));

        // Reopening with another version is accepted and overwrites the record.
        let reopened = websql.open_database("mydb", "2.0", "Test DB v2", 2048)?;
        assert_eq!(reopened.version(), "2.0");
        assert_eq!(reopened.display_name(), "Test DB v2");
        assert_eq!(reopened.size(), 2048);
        websql.open_database("other", "1.0", "Other", 1)?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    // A fresh store over the same file sees what the first service wrote.
    let configs = websql_middleware::config::all_configurations(&JsonFileStore::new(&path))?;
    assert_eq!(configs.len(), 2);
    assert_eq!(
        configs["mydb"],
        DatabaseConfig {
            name: "mydb".into(),
            version: "2.0".into(),
            display_name: "Test DB v2".into(),
            size: 2048,
            locked: false,
        }
    );
    Ok(())
}

// The advisory lock flag is persisted but nothing consults it: writes still go through.
#[test]
fn locked_flag_is_stored_but_not_enforced() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let log = new_log();
        let websql = WebSql::builder().driver(RecordingDriver::new(&log)).build()?;
        let db = websql.open_database("locked", "1.0", "Locked", 0)?;

        let mut updates = Map::new();
        updates.insert("locked".into(), json!(true));
        websql.update_database_configuration("locked", updates)?;
        assert!(websql.database_configurations()?["locked"].locked);

        let outcome = db
            .transaction(|tx| tx.execute_sql("STEP write", &[]))
            .await?;
        assert!(outcome.is_committed());
        assert!(entries(&log).iter().any(|sql| sql == "STEP write"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn configuring_an_unopened_database_keeps_configs_readable()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let websql = WebSql::builder().build()?;
        websql.open_database("a", "1.0", "A", 0)?;

        let mut updates = Map::new();
        updates.insert("locked".into(), json!(true));
        websql.update_database_configuration("b", updates)?;

        let configs = websql.database_configurations()?;
        assert_eq!(configs.len(), 2);
        assert_eq!(configs["a"].version, "1.0");
        assert_eq!(configs["b"].name, "b");
        assert!(configs["b"].locked);

        let opened = websql.open_database("b", "3.0", "B", 9)?;
        assert_eq!(opened.version(), "3.0");
        let configs = websql.database_configurations()?;
        let b = &configs["b"];
        assert_eq!((b.version.as_str(), b.size, b.locked), ("3.0", 9, true));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn directory_storage_survives_a_new_service() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = SqliteDriverOptionsBuilder::directory(dir.path()).build();
        let websql = WebSql::builder().driver(driver).build()?;
        let db = websql.open_database("notes", "1.0", "Notes", 0)?;
        db.transaction(|tx| {
            tx.execute_sql("CREATE TABLE notes (body TEXT)", &[])?;
            tx.execute_sql("INSERT INTO notes (body) VALUES (?)", &["kept".into()])
        })
        .await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    drop(rt);
    assert!(dir.path().join("notes.sqlite").exists());

    let rt = Runtime::new()?;
    rt.block_on(async {
        let driver = SqliteDriverOptionsBuilder::directory(dir.path()).wal(false).build();
        let websql = WebSql::builder().driver(driver).build()?;
        let db = websql.open_database("notes", "1.0", "Notes", 0)?;

        let bodies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&bodies);
        db.read_transaction(move |tx| {
            tx.execute_sql_with(
                "SELECT body FROM notes",
                &[],
                StatementCallbacks::new().on_result(move |_tx, rs| {
                    for row in rs.rows() {
                        if let Some(body) = row.get("body").and_then(RowValues::as_text) {
                            sink.lock().unwrap().push(body.to_string());
                        }
                    }
                }),
            )
        })
        .await?;
        assert_eq!(*bodies.lock().unwrap(), vec!["kept".to_string()]);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
