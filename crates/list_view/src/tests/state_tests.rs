use serde_json::{json, Value};
use shared::error::DashboardError;

use crate::{render, ListViewState, Predicate, Record, SortKey};

fn records(value: Value) -> Vec<Record> {
    serde_json::from_value(value).expect("records")
}

fn ids(records: &[&Record]) -> Vec<i64> {
    records
        .iter()
        .map(|record| record.id().and_then(Value::as_i64).expect("numeric id"))
        .collect()
}

fn employees() -> Vec<Record> {
    (1..=25)
        .map(|id| {
            let department = if id % 5 == 0 { "finance" } else { "engineering" };
            Record::from_value(json!({
                "id": id,
                "name": format!("Employee {id:02}"),
                "department": department,
            }))
            .expect("object")
        })
        .collect()
}

#[test]
fn renders_unpaid_invoices_end_to_end() {
    let rows = records(json!([
        {"id": 1, "total": 100, "status": "paid"},
        {"id": 2, "total": 50, "status": "unpaid"}
    ]));
    let mut state = ListViewState::new(10).expect("state");
    state.set_filter("status", Predicate::equals("status", "unpaid"));
    state.set_search("");

    let page = state.render(&rows).expect("render");
    assert_eq!(ids(&page.items), vec![2]);
    assert_eq!(page.total_items, 1);
    assert_eq!(page.total_pages, 1);
}

#[test]
fn changing_filter_resets_page_index() {
    let rows = employees();
    let mut state = ListViewState::new(5).expect("state");
    state.set_page(3);
    assert_eq!(state.page_index(), 3);

    state.set_filter("department", Predicate::equals("department", "finance"));
    assert_eq!(state.page_index(), 0);

    let page = state.render(&rows).expect("render");
    assert_eq!(ids(&page.items), vec![5, 10, 15, 20, 25]);
    assert_eq!(page.page_index, 0);
}

#[test]
fn changing_search_resets_page_index() {
    let rows = employees();
    let mut state = ListViewState::new(4).expect("state");
    state.next_page();
    state.next_page();
    assert_eq!(state.page_index(), 2);

    state.set_search("employee 1");
    assert_eq!(state.page_index(), 0);
    let page = state.render(&rows).expect("render");
    assert_eq!(ids(&page.items), vec![10, 11, 12, 13]);

    state.set_page(2);
    state.set_search_fields(["department"]);
    assert_eq!(state.page_index(), 0);

    state.set_page(1);
    state.clear_filter("department");
    assert_eq!(state.page_index(), 0);

    state.set_page(1);
    state.clear_filters();
    assert_eq!(state.page_index(), 0);
}

#[test]
fn changing_sort_keeps_page_index() {
    let rows = employees();
    let mut state = ListViewState::new(10).expect("state");
    state.set_page(1);
    state.set_sort(Some(SortKey::descending("id")));

    let page = state.render(&rows).expect("render");
    assert_eq!(page.page_index, 1);
    assert_eq!(ids(&page.items), (6..=15).rev().collect::<Vec<_>>());
}

#[test]
fn stale_page_index_is_clamped_on_render() {
    let rows = employees();
    let mut state = ListViewState::new(10).expect("state");
    state.set_page(40);

    let page = state.render(&rows).expect("render");
    assert_eq!(page.page_index, 2);
    assert_eq!(ids(&page.items), vec![21, 22, 23, 24, 25]);

    state.prev_page();
    assert_eq!(state.page_index(), 39);
}

#[test]
fn absent_records_render_as_empty() {
    let state = ListViewState::default();
    let page = render(None, &state).expect("render");

    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 0);
    assert_eq!(page.page_index, 0);
}

#[test]
fn rejects_zero_page_size() {
    assert!(matches!(
        ListViewState::new(0),
        Err(DashboardError::InvalidConfiguration(_))
    ));

    let mut state = ListViewState::new(5).expect("state");
    state.set_page(2);
    assert!(state.set_page_size(0).is_err());
    assert_eq!(state.page_size(), 5);

    state.set_page_size(20).expect("page size");
    assert_eq!(state.page_index(), 0);
}
