use std::fs;

use restaurant_daka::records::NewVisit;
use restaurant_daka::stats::{DateRange, Summary, most_common_type};
use restaurant_daka::store::{CsvRecordStore, RecordStore};

#[test]
fn test_missing_file_opens_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CsvRecordStore::open(tmp.path().join("none.csv")).unwrap();
    assert!(store.is_empty());
    assert!(store.all().is_empty());
}

#[test]
fn test_records_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("data").join("records.csv");

    {
        let mut store = CsvRecordStore::open(&path).unwrap();
        store
            .insert(
                NewVisit::new("海底捞", "火锅", "2023-10-01", 9.5).with_comment("服务好, 排队久"),
            )
            .unwrap();
        store
            .insert(NewVisit::new("小四川", "川菜", "2023-10-02", 8.0).with_image("images/x.png"))
            .unwrap();
    }

    let store = CsvRecordStore::open(&path).unwrap();
    let records = store.all();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "小四川");
    assert_eq!(records[0].image_path.as_deref(), Some("images/x.png"));
    assert_eq!(records[1].comment, "服务好, 排队久");
    assert_eq!(records[1].image_path, None);

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("id,name,type,date,score,comment,image_path"));
}

#[test]
fn test_id_counter_persists_across_delete_and_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("records.csv");

    {
        let mut store = CsvRecordStore::open(&path).unwrap();
        store.insert(NewVisit::new("A", "火锅", "2023-10-01", 9.0)).unwrap();
        store.insert(NewVisit::new("B", "川菜", "2023-10-02", 8.0)).unwrap();
        assert_eq!(store.delete("2").unwrap().len(), 1);
    }

    let mut store = CsvRecordStore::open(&path).unwrap();
    let record = store.insert(NewVisit::new("C", "粤菜", "2023-10-03", 7.0)).unwrap();
    assert_eq!(record.id, 3);
}

#[test]
fn test_stale_meta_is_reconciled() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("records.csv");
    {
        let mut store = CsvRecordStore::open(&path).unwrap();
        store.insert(NewVisit::new("A", "火锅", "2023-10-01", 9.0)).unwrap();
    }
    fs::remove_file(tmp.path().join("records.csv.meta.json")).unwrap();

    let mut store = CsvRecordStore::open(&path).unwrap();
    let record = store.insert(NewVisit::new("B", "火锅", "2023-10-02", 8.0)).unwrap();
    assert_eq!(record.id, 2);
}

#[test]
fn test_rejected_insert_leaves_file_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("records.csv");

    let mut store = CsvRecordStore::open(&path).unwrap();
    assert!(store.insert(NewVisit::new("A", "火锅", "10/01/2023", 9.0)).is_err());
    assert!(!path.exists());
}

#[test]
fn test_store_snapshot_feeds_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = CsvRecordStore::open(tmp.path().join("records.csv")).unwrap();
    for (name, category, date, score) in [
        ("海底捞", "火锅", "2023-10-01", 9.5),
        ("小四川", "川菜", "2023-10-02", 8.0),
        ("重庆火锅", "火锅", "2023-10-03", 8.5),
        ("川味坊", "川菜", "2023-10-04", 7.5),
    ] {
        store.insert(NewVisit::new(name, category, date, score)).unwrap();
    }

    let records = store.all();
    let summary = Summary::from_records(&records, None);
    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.ranking[0].name, "海底捞");
    assert_eq!(summary.ranking[0].category, "火锅");
    assert_eq!(summary.types.len(), 2);

    let range = DateRange::new("2023-10-02", "2023-10-04");
    assert_eq!(most_common_type(&records, Some(&range)), "川菜 (2次)");
}

#[test]
fn test_failed_insert_save_leaves_snapshot_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    fs::write(&blocker, b"plain file").unwrap();

    let mut store = CsvRecordStore::open(blocker.join("records.csv")).unwrap();
    let result = store.insert(NewVisit::new("A", "火锅", "2023-10-01", 9.0));

    assert!(result.is_err());
    assert!(store.all().is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_failed_delete_save_leaves_snapshot_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("data");
    let mut store = CsvRecordStore::open(dir.join("records.csv")).unwrap();
    store.insert(NewVisit::new("A", "火锅", "2023-10-01", 9.0)).unwrap();

    fs::remove_dir_all(&dir).unwrap();
    fs::write(&dir, b"plain file").unwrap();

    assert!(store.delete("1").is_err());
    assert_eq!(store.all().len(), 1);

    fs::remove_file(&dir).unwrap();
    let record = store.insert(NewVisit::new("B", "川菜", "2023-10-02", 8.0)).unwrap();
    assert_eq!(record.id, 2);

    let reopened = CsvRecordStore::open(dir.join("records.csv")).unwrap();
    assert_eq!(reopened.all().len(), 2);
}
