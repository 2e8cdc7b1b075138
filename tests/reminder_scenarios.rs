//! End-to-end reminder scenarios through the client facade.
//!
//! Every call goes client → envelope → gateway dispatcher → in-memory store
//! and back, exercising the same contract the subprocess gateway uses.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{NaiveDate, TimeZone, Utc};

use reminder_bridge::params::{
    CreateReminderParams, DeleteReminderParams, ListRemindersParams, SearchRemindersParams,
    UpdateReminderParams,
};
use reminder_bridge::store::NativeList;
use reminder_bridge::store::memory::MemoryStore;
use reminder_bridge::{InProcessGateway, ReminderError, RemindersClient};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn client() -> RemindersClient<InProcessGateway<MemoryStore>> {
    RemindersClient::new(InProcessGateway::new(MemoryStore::new()))
}

fn create(
    client: &RemindersClient<InProcessGateway<MemoryStore>>,
    list: &str,
    name: &str,
    due: Option<&str>,
) {
    client
        .create_reminder(&CreateReminderParams {
            name: name.to_owned(),
            list_name: list.to_owned(),
            due_date: due.map(str::to_owned),
            ..CreateReminderParams::default()
        })
        .unwrap();
}

fn in_list(list: &str) -> ListRemindersParams {
    ListRemindersParams {
        list_name: Some(list.to_owned()),
        ..ListRemindersParams::default()
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn groceries_create_list_and_complete() {
    let client = client();
    client.create_list("Groceries").unwrap();
    let milk = client
        .create_reminder(&CreateReminderParams {
            name: "Milk".to_owned(),
            list_name: "Groceries".to_owned(),
            body: Some("2%".to_owned()),
            ..CreateReminderParams::default()
        })
        .unwrap();
    assert_eq!(milk.name, "Milk");
    assert_eq!(milk.list_name, "Groceries");
    assert_eq!(milk.body.as_deref(), Some("2%"));
    assert!(!milk.completed);

    let listed = client.list_reminders(&in_list("Groceries")).unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].name, "Milk");
    assert!(!listed.items[0].completed);
    assert_eq!(listed.items[0].priority, 0);

    let lists = client.list_lists().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].reminder_count, 1);

    let done = client
        .update_reminder(&UpdateReminderParams {
            reminder_name: "Milk".to_owned(),
            list_name: "Groceries".to_owned(),
            completed: Some(true),
            ..UpdateReminderParams::default()
        })
        .unwrap();
    assert!(done.completed);
    assert!(done.completion_date.is_some());
    assert_eq!(client.list_lists().unwrap()[0].reminder_count, 0);

    let reopened = client
        .update_reminder(&UpdateReminderParams {
            reminder_name: "Milk".to_owned(),
            list_name: "Groceries".to_owned(),
            completed: Some(false),
            ..UpdateReminderParams::default()
        })
        .unwrap();
    assert!(!reopened.completed);
    assert!(reopened.completion_date.is_none());
}

#[test]
fn work_reminders_ordered_by_due_date() {
    let client = client();
    client.create_list("Work").unwrap();
    create(&client, "Work", "Later", Some("2024-03-10T09:00:00Z"));
    create(&client, "Work", "Undated", None);
    create(&client, "Work", "Sooner", Some("2024-03-05T09:00:00Z"));

    let page = client.list_reminders(&in_list("Work")).unwrap();
    let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Sooner", "Later", "Undated"]);
    assert_eq!(page.total, 3);
    assert!(!page.has_more);
}

#[test]
fn deleted_list_is_not_found_afterwards() {
    let client = client();
    client.create_list("Trip").unwrap();
    create(&client, "Trip", "Passport", None);

    client.delete_list("Trip").unwrap();
    assert!(matches!(
        client.list_reminders(&in_list("Trip")),
        Err(ReminderError::NotFound(_))
    ));
    assert!(matches!(
        client.delete_list("Trip"),
        Err(ReminderError::NotFound(_))
    ));
    assert!(client.gateway().store().snapshot_reminders().is_empty());
}

#[test]
fn search_is_case_insensitive_substring() {
    let client = client();
    client.create_list("Work").unwrap();
    client.create_list("Home").unwrap();
    create(&client, "Work", "Team Meeting", None);
    create(&client, "Home", "meet plumber", None);
    create(&client, "Work", "Write report", None);

    let page = client
        .search_reminders(&SearchRemindersParams {
            query: "meet".to_owned(),
            ..SearchRemindersParams::default()
        })
        .unwrap();
    let mut names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Team Meeting", "meet plumber"]);

    let scoped = client
        .search_reminders(&SearchRemindersParams {
            query: "MEET".to_owned(),
            list_name: Some("Home".to_owned()),
            ..SearchRemindersParams::default()
        })
        .unwrap();
    assert_eq!(scoped.total, 1);

    let none = client
        .search_reminders(&SearchRemindersParams {
            query: "dentist".to_owned(),
            ..SearchRemindersParams::default()
        })
        .unwrap();
    assert!(none.items.is_empty());
    assert_eq!(none.total, 0);
}

// ─── Round trips ─────────────────────────────────────────────────────────────

#[test]
fn timed_due_round_trips_to_the_second() {
    let client = client();
    client.create_list("Work").unwrap();
    let created = client
        .create_reminder(&CreateReminderParams {
            name: "Standup".to_owned(),
            list_name: "Work".to_owned(),
            due_date: Some("2024-03-05T09:30:15+02:00".to_owned()),
            ..CreateReminderParams::default()
        })
        .unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 15).unwrap();
    assert_eq!(created.due_date(), Some(expected));
    assert!(created.all_day_due_date().is_none());
    assert!(!created.is_all_day());

    let listed = client.list_reminders(&in_list("Work")).unwrap();
    assert_eq!(listed.items[0].due_date(), Some(expected));
}

#[test]
fn all_day_due_round_trips_to_the_date() {
    let client = client();
    client.create_list("Home").unwrap();
    let created = client
        .create_reminder(&CreateReminderParams {
            name: "Bins".to_owned(),
            list_name: "Home".to_owned(),
            all_day_due_date: Some("2024-03-10".to_owned()),
            ..CreateReminderParams::default()
        })
        .unwrap();
    assert!(created.is_all_day());
    assert_eq!(
        created.all_day_due_date(),
        Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    );
    assert!(created.due_date().is_none());
}

#[test]
fn all_day_wins_when_both_due_forms_given() {
    let client = client();
    client.create_list("Home").unwrap();
    let created = client
        .create_reminder(&CreateReminderParams {
            name: "Bins".to_owned(),
            list_name: "Home".to_owned(),
            due_date: Some("2024-03-09T18:00:00Z".to_owned()),
            all_day_due_date: Some("2024-03-10".to_owned()),
            ..CreateReminderParams::default()
        })
        .unwrap();
    assert!(created.is_all_day());
}

#[test]
fn remind_me_date_is_kept() {
    let client = client();
    client.create_list("Home").unwrap();
    let created = client
        .create_reminder(&CreateReminderParams {
            name: "Call mum".to_owned(),
            list_name: "Home".to_owned(),
            remind_me_date: Some("2024-04-01T08:00:00Z".to_owned()),
            priority: Some(1),
            ..CreateReminderParams::default()
        })
        .unwrap();
    assert_eq!(
        created.remind_me_date,
        Some(Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap())
    );
    assert_eq!(created.priority, 1);
}

// ─── Existing list names ─────────────────────────────────────────────────────

fn seeded_client(titles: &[&str]) -> RemindersClient<InProcessGateway<MemoryStore>> {
    let lists = titles
        .iter()
        .enumerate()
        .map(|(i, title)| NativeList {
            id: format!("list-{i}"),
            title: (*title).to_owned(),
        })
        .collect();
    RemindersClient::new(InProcessGateway::new(MemoryStore::seeded(lists, Vec::new())))
}

#[test]
fn long_native_list_name_is_usable() {
    let long = "L".repeat(250);
    let client = seeded_client(&[long.as_str()]);
    create(&client, &long, "Milk", None);

    let page = client.list_reminders(&in_list(&long)).unwrap();
    assert_eq!(page.total, 1);
    client
        .update_reminder(&UpdateReminderParams {
            reminder_name: "Milk".to_owned(),
            list_name: long.clone(),
            completed: Some(true),
            ..UpdateReminderParams::default()
        })
        .unwrap();
    client
        .delete_reminder(&DeleteReminderParams {
            reminder_name: "Milk".to_owned(),
            list_name: long.clone(),
        })
        .unwrap();
    client.delete_list(&long).unwrap();
    assert!(client.list_lists().unwrap().is_empty());
}

#[test]
fn list_names_match_without_trimming() {
    let client = seeded_client(&[" Work"]);
    create(&client, " Work", "Slides", None);

    let err = client
        .create_reminder(&CreateReminderParams {
            name: "Notes".to_owned(),
            list_name: "Work".to_owned(),
            ..CreateReminderParams::default()
        })
        .unwrap_err();
    assert!(matches!(err, ReminderError::NotFound(_)));
    assert!(matches!(
        client.delete_reminder(&DeleteReminderParams {
            reminder_name: "Slides".to_owned(),
            list_name: "Work".to_owned(),
        }),
        Err(ReminderError::NotFound(_))
    ));
    assert!(matches!(
        client.delete_list("Work"),
        Err(ReminderError::NotFound(_))
    ));

    let page = client.list_reminders(&in_list(" Work")).unwrap();
    assert_eq!(page.items[0].list_name, " Work");
}

// ─── Failure modes ───────────────────────────────────────────────────────────

#[test]
fn create_into_missing_list_is_not_found() {
    let client = client();
    let err = client
        .create_reminder(&CreateReminderParams {
            name: "Milk".to_owned(),
            list_name: "Groceries".to_owned(),
            ..CreateReminderParams::default()
        })
        .unwrap_err();
    assert!(matches!(err, ReminderError::NotFound(_)));
    assert!(client.list_lists().unwrap().is_empty());
}

#[test]
fn blank_name_is_validation_error() {
    let client = client();
    client.create_list("Groceries").unwrap();
    let err = client
        .create_reminder(&CreateReminderParams {
            name: "   ".to_owned(),
            list_name: "Groceries".to_owned(),
            ..CreateReminderParams::default()
        })
        .unwrap_err();
    assert!(matches!(err, ReminderError::Validation(_)));
}

#[test]
fn empty_update_is_validation_error() {
    let client = client();
    client.create_list("Groceries").unwrap();
    create(&client, "Groceries", "Milk", None);
    let err = client
        .update_reminder(&UpdateReminderParams {
            reminder_name: "Milk".to_owned(),
            list_name: "Groceries".to_owned(),
            ..UpdateReminderParams::default()
        })
        .unwrap_err();
    assert_eq!(err, ReminderError::Validation("no updates provided".to_owned()));
}

#[test]
fn repeated_delete_is_not_found() {
    let client = client();
    client.create_list("Groceries").unwrap();
    create(&client, "Groceries", "Milk", None);
    let target = DeleteReminderParams {
        reminder_name: "Milk".to_owned(),
        list_name: "Groceries".to_owned(),
    };
    client.delete_reminder(&target).unwrap();
    assert!(matches!(
        client.delete_reminder(&target),
        Err(ReminderError::NotFound(_))
    ));
}

#[test]
fn duplicate_list_rejected() {
    let client = client();
    client.create_list("Groceries").unwrap();
    assert!(matches!(
        client.create_list("Groceries"),
        Err(ReminderError::Validation(_))
    ));
    assert_eq!(client.list_lists().unwrap().len(), 1);
}

#[test]
fn denied_access_is_permission_error() {
    let client = RemindersClient::new(InProcessGateway::new(MemoryStore::denied()));
    assert!(matches!(
        client.list_lists(),
        Err(ReminderError::Permission(_))
    ));
}

// ─── Counting and paging ─────────────────────────────────────────────────────

#[test]
fn count_matches_listing_for_every_filter() {
    let client = client();
    client.create_list("Work").unwrap();
    client.create_list("Home").unwrap();
    for i in 0..7 {
        create(&client, "Work", &format!("task {i}"), None);
    }
    for i in 0..4 {
        create(&client, "Home", &format!("chore {i}"), None);
    }
    for name in ["task 1", "task 4"] {
        client
            .update_reminder(&UpdateReminderParams {
                reminder_name: name.to_owned(),
                list_name: "Work".to_owned(),
                completed: Some(true),
                ..UpdateReminderParams::default()
            })
            .unwrap();
    }

    for list_name in [None, Some("Work"), Some("Home")] {
        for completed in [None, Some(true), Some(false)] {
            let filter = ListRemindersParams {
                list_name: list_name.map(str::to_owned),
                completed,
                limit: Some(200),
                ..ListRemindersParams::default()
            };
            let listed = client.list_reminders(&filter).unwrap();
            let counted = client.count_reminders(&filter).unwrap();
            assert_eq!(counted, listed.items.len(), "{list_name:?} {completed:?}");
            assert_eq!(counted, listed.total);
        }
    }
}

#[test]
fn pages_concatenate_to_the_full_listing() {
    let client = client();
    client.create_list("Work").unwrap();
    for day in 1..=9 {
        create(
            &client,
            "Work",
            &format!("item {day}"),
            Some(format!("2024-05-0{day}T10:00:00Z").as_str()),
        );
    }

    let full = client
        .list_reminders(&ListRemindersParams {
            limit: Some(200),
            ..ListRemindersParams::default()
        })
        .unwrap();

    let mut stitched = Vec::new();
    let mut offset = 0;
    loop {
        let page = client
            .list_reminders(&ListRemindersParams {
                offset: Some(offset),
                limit: Some(4),
                ..ListRemindersParams::default()
            })
            .unwrap();
        assert_eq!(page.total, 9);
        stitched.extend(page.items.into_iter().map(|r| r.id));
        if !page.has_more {
            break;
        }
        offset += 4;
    }
    let expected: Vec<String> = full.items.into_iter().map(|r| r.id).collect();
    assert_eq!(stitched, expected);
}

#[test]
fn limit_above_cap_is_clamped() {
    let client = client();
    client.create_list("Work").unwrap();
    let page = client
        .list_reminders(&ListRemindersParams {
            limit: Some(10_000),
            ..ListRemindersParams::default()
        })
        .unwrap();
    assert_eq!(page.limit, 200);
}
