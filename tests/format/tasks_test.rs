//! Tests for task listing rendering.

use rituo::format::tasks::{created_task_id, format_tasks};

#[test]
fn counts_open_tasks_and_marks_completed() {
    let raw = "Tasks in list MTIz:\n\
               - Buy milk (ID: t1)\n  Status: needsAction\n  Due: 2024-01-03T00:00:00.000Z\n\
               - Pay rent (ID: t2)\n  Status: completed";
    let text = format_tasks(raw).expect("tasks parse");

    assert!(text.starts_with("Your tasks (2 total, 1 open):"));
    assert!(text.contains("1. [ ] Buy milk\n   Due: 2024-01-03T00:00:00.000Z\n   ID: t1"));
    assert!(text.contains("2. [x] Pay rent\n   ID: t2"));
}

#[test]
fn empty_listing_is_not_reformatted() {
    assert!(format_tasks("No tasks found in list @default.").is_none());
}

#[test]
fn mixed_listing_keeps_header_and_unknown_details() {
    let raw = "Tasks in list MTIz:\n\
               - Buy milk (ID: t1)\n  Status: needsAction\n  Parent: t0\n\
               - Loose line without id\n\
               - Pay rent (ID: t2)";
    let text = format_tasks(raw).expect("tasks parse");

    assert!(text.starts_with("Your tasks (2 total, 2 open):\n\nTasks in list MTIz:"));
    assert!(text.contains("1. [ ] Buy milk\n   ID: t1\n   Parent: t0\n   - Loose line without id"));
    assert!(text.contains("2. [ ] Pay rent\n   ID: t2"));
}

#[test]
fn creation_result_id() {
    assert_eq!(
        created_task_id("Created task 'Buy milk' (ID: tk1)").as_deref(),
        Some("tk1")
    );
    assert!(created_task_id("Task queued.").is_none());
}
