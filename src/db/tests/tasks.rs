use crate::db::{Database, NewExportTask};
use crate::types::{TaskId, TaskStatus};
use tempfile::NamedTempFile;

async fn open_db(temp_file: &NamedTempFile) -> Database {
    Database::new(temp_file.path()).await.unwrap()
}

fn new_task(task_id: &TaskId, total_count: i64) -> NewExportTask {
    NewExportTask {
        task_id: task_id.clone(),
        task_name: "employee export".to_string(),
        export_type: "user".to_string(),
        created_by: "system".to_string(),
        total_count,
    }
}

#[tokio::test]
async fn test_insert_and_get_task() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 250_000)).await.unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(row.task_id, id.as_str());
    assert_eq!(row.task_name, "employee export");
    assert_eq!(row.export_type, "user");
    assert_eq!(row.status, "PENDING");
    assert_eq!(row.total_count, 250_000);
    assert_eq!(row.processed_count, 0);
    assert_eq!(row.progress, 0.0);
    assert!(row.file_path.is_none());
    assert!(row.started_at.is_none());
    assert!(row.ended_at.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_get_missing_task_returns_none() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let row = db.get_task(&TaskId::from("nope")).await.unwrap();
    assert!(row.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_mark_started_sets_processing_and_timestamp() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 100)).await.unwrap();
    db.mark_started(&id).await.unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(row.status, "PROCESSING");
    assert!(row.started_at.is_some());

    db.close().await;
}

#[tokio::test]
async fn test_progress_updates_persist() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 20_000)).await.unwrap();
    db.update_progress(&id, 10_000, 50.0).await.unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(row.processed_count, 10_000);
    assert_eq!(row.progress, 50.0);

    db.close().await;
}

#[tokio::test]
async fn test_terminal_status_is_never_overwritten() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 100)).await.unwrap();
    db.mark_started(&id).await.unwrap();
    db.mark_ended(&id, TaskStatus::Success, None).await.unwrap();

    // A late failure report must not flip a finished task
    db.mark_ended(&id, TaskStatus::Failed, Some("too late"))
        .await
        .unwrap();
    db.update_status(&id, TaskStatus::Processing).await.unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(row.status, "SUCCESS");
    assert!(row.error_message.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_mark_ended_failed_records_message() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 100)).await.unwrap();
    db.mark_started(&id).await.unwrap();
    db.mark_ended(&id, TaskStatus::Failed, Some("source unavailable"))
        .await
        .unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(row.status, "FAILED");
    assert_eq!(row.error_message.as_deref(), Some("source unavailable"));
    assert!(row.ended_at.is_some());

    db.close().await;
}

#[tokio::test]
async fn test_update_file_info() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let id = TaskId::generate();
    db.insert_task(&new_task(&id, 100)).await.unwrap();
    db.update_file_info(&id, "/tmp/out/export_20250101_120000.xlsx", "export_20250101_120000.xlsx", 4096)
        .await
        .unwrap();

    let row = db.get_task(&id).await.unwrap().unwrap();
    assert_eq!(
        row.file_name.as_deref(),
        Some("export_20250101_120000.xlsx")
    );
    assert_eq!(row.file_size, Some(4096));

    db.close().await;
}

#[tokio::test]
async fn test_count_processing_only_counts_processing() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let pending = TaskId::generate();
    let processing = TaskId::generate();
    let done = TaskId::generate();

    for id in [&pending, &processing, &done] {
        db.insert_task(&new_task(id, 100)).await.unwrap();
    }
    db.mark_started(&processing).await.unwrap();
    db.mark_started(&done).await.unwrap();
    db.mark_ended(&done, TaskStatus::Success, None).await.unwrap();

    assert_eq!(db.count_processing().await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_list_tasks_by_creator_is_recent_first_and_limited() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let id = TaskId::generate();
        db.insert_task(&new_task(&id, 100)).await.unwrap();
        ids.push(id);
        // created_at has second resolution; force distinct timestamps
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    }

    let other = NewExportTask {
        created_by: "alice".to_string(),
        ..new_task(&TaskId::generate(), 100)
    };
    db.insert_task(&other).await.unwrap();

    let rows = db.list_tasks_by_creator("system", 2).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].task_id, ids[2].as_str());
    assert_eq!(rows[1].task_id, ids[1].as_str());

    db.close().await;
}
