//! Job store unit tests

use chrono::Utc;
use mdpress_console::models::job::{Job, JobStatus, Pagination};
use mdpress_console::store::jobs::JobStore;

fn create_test_job(id: &str, status: JobStatus, age_secs: i64) -> Job {
    let now = Utc::now();
    Job {
        id: id.to_string(),
        status,
        created_at: now - chrono::Duration::seconds(age_secs),
        updated_at: now,
        input: None,
        user_id: None,
    }
}

fn page(page: u32) -> Pagination {
    Pagination {
        page,
        limit: 20,
        total: 2,
        total_pages: 1,
    }
}

#[test]
fn test_replace_page_is_wholesale() {
    let store = JobStore::new();

    store.replace_page(
        vec![
            create_test_job("j2", JobStatus::Pending, 10),
            create_test_job("j1", JobStatus::Completed, 300),
        ],
        page(1),
    );
    assert_eq!(store.len(), 2);
    assert_eq!(store.newest().unwrap().id, "j2");

    store.replace_page(vec![create_test_job("j3", JobStatus::Queued, 5)], page(1));
    assert_eq!(store.len(), 1);
    assert_eq!(store.newest().unwrap().id, "j3");
    assert!(store.get("j1").is_none());
}

#[test]
fn test_merge_replaces_in_place() {
    let store = JobStore::new();
    store.replace_page(
        vec![
            create_test_job("j2", JobStatus::Pending, 10),
            create_test_job("j1", JobStatus::Completed, 300),
        ],
        page(1),
    );

    let previous = store.merge_job(create_test_job("j2", JobStatus::Running, 10));
    assert_eq!(previous, Some(JobStatus::Pending));

    // Position preserved, status updated
    let jobs = store.jobs();
    assert_eq!(jobs[0].id, "j2");
    assert_eq!(jobs[0].status, JobStatus::Running);
    assert_eq!(jobs[1].id, "j1");
}

#[test]
fn test_merge_unknown_id_is_noop() {
    let store = JobStore::new();
    store.replace_page(vec![create_test_job("j1", JobStatus::Pending, 10)], page(1));

    let previous = store.merge_job(create_test_job("ghost", JobStatus::Running, 1));
    assert_eq!(previous, None);
    assert_eq!(store.len(), 1);
    assert!(store.get("ghost").is_none());
}

#[test]
fn test_error_retains_previous_list() {
    let store = JobStore::new();
    store.replace_page(vec![create_test_job("j1", JobStatus::Pending, 10)], page(1));

    store.set_error("502 Bad Gateway".to_string());

    assert_eq!(store.len(), 1);
    assert_eq!(store.last_error().as_deref(), Some("502 Bad Gateway"));

    // A successful reload clears the error
    store.replace_page(vec![create_test_job("j1", JobStatus::Running, 12)], page(1));
    assert!(store.last_error().is_none());
}

#[test]
fn test_current_page_defaults_to_first() {
    let store = JobStore::new();
    assert_eq!(store.current_page(), 1);

    store.replace_page(vec![], page(3));
    assert_eq!(store.current_page(), 3);
}
