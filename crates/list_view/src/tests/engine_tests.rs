use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::error::DashboardError;

use crate::{
    apply_filters, apply_search, apply_sort, paginate, FilterSet, Predicate, Record, SearchQuery,
    SortDirection, SortKey, ALL, PLACEHOLDER,
};

fn records(value: Value) -> Vec<Record> {
    serde_json::from_value(value).expect("records")
}

fn ids(records: &[&Record]) -> Vec<i64> {
    records
        .iter()
        .map(|record| record.id().and_then(Value::as_i64).expect("numeric id"))
        .collect()
}

fn invoices() -> Vec<Record> {
    records(json!([
        {"id": 1, "total": 100, "status": "paid", "client": {"name": "Acme"}, "issued": "2024-03-01"},
        {"id": 2, "total": 50, "status": "unpaid", "client": {"name": "Globex"}, "issued": "2024-01-15"},
        {"id": 3, "total": "75.5", "status": "Unpaid", "client": {"name": "acme labs"}, "issued": "2024-02-10T09:30:00Z"},
        {"id": 4, "total": 300, "status": "overdue", "client": null},
        {"id": 5, "total": 50, "status": "paid", "client": {"name": "Initech"}, "issued": "2023-12-31"}
    ]))
}

#[test]
fn resolves_nested_paths_and_renders_placeholder() {
    let rows = records(json!([
        {"id": 9, "client": {"name": "Acme", "tags": ["vip", "eu"]}, "note": "  ", "owner": null}
    ]));
    let record = &rows[0];

    assert_eq!(record.text("client.name").as_deref(), Some("Acme"));
    assert_eq!(record.text("client.tags.1").as_deref(), Some("eu"));
    assert_eq!(record.field("client.tags.7"), None);
    assert_eq!(record.display("owner"), PLACEHOLDER);
    assert_eq!(record.display("note"), PLACEHOLDER);
    assert_eq!(record.display("missing.path"), PLACEHOLDER);
    assert_eq!(record.display("id"), "9");
}

#[test]
fn filters_combine_with_and() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let filters = FilterSet::new()
        .with("status", Predicate::equals("status", "unpaid"))
        .with("amount", Predicate::number_range("total", Some(60.0), None));

    assert_eq!(ids(&apply_filters(&all, &filters)), vec![3]);
}

#[test]
fn sentinel_values_impose_no_constraint() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let filters = FilterSet::new()
        .with("status", Predicate::equals("status", ALL))
        .with("category", Predicate::equals("category", ""))
        .with("kind", Predicate::one_of("status", [ALL, "paid"]))
        .with("dates", Predicate::date_range("issued", None, None));

    assert_eq!(ids(&apply_filters(&all, &filters)), vec![1, 2, 3, 4, 5]);
}

#[test]
fn filtering_is_idempotent() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let filters = FilterSet::new()
        .with("status", Predicate::one_of("status", ["paid", "overdue"]))
        .with("big", Predicate::custom(|record| {
            record.field("total").and_then(Value::as_f64).unwrap_or(0.0) > 60.0
        }));

    let once = apply_filters(&all, &filters);
    let twice = apply_filters(&once, &filters);
    assert_eq!(ids(&once), vec![1, 4]);
    assert_eq!(ids(&once), ids(&twice));
}

#[test]
fn filter_and_search_commute() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let filters = FilterSet::new().with("status", Predicate::equals("status", "unpaid"));
    let query = SearchQuery::new("  ACME ").over(["client.name"]);

    let mut filter_first = ids(&apply_search(&apply_filters(&all, &filters), &query));
    let mut search_first = ids(&apply_filters(&apply_search(&all, &query), &filters));
    filter_first.sort_unstable();
    search_first.sort_unstable();

    assert_eq!(filter_first, vec![3]);
    assert_eq!(filter_first, search_first);
}

#[test]
fn blank_search_returns_input_unchanged() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();

    assert_eq!(ids(&apply_search(&all, &SearchQuery::new("   "))), vec![1, 2, 3, 4, 5]);
}

#[test]
fn search_without_fields_uses_top_level_scalars() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();

    assert_eq!(ids(&apply_search(&all, &SearchQuery::new("OVERDUE"))), vec![4]);
    // Nested objects are not part of the default projection.
    assert!(apply_search(&all, &SearchQuery::new("globex")).is_empty());
}

#[test]
fn equality_filters_fold_non_ascii_case_like_search() {
    let rows = records(json!([
        {"id": 1, "status": "Ünpaid"},
        {"id": 2, "status": "paid"}
    ]));
    let all: Vec<&Record> = rows.iter().collect();

    let equals = FilterSet::new().with("status", Predicate::equals("status", " ünpaid "));
    assert_eq!(ids(&apply_filters(&all, &equals)), vec![1]);

    let one_of = FilterSet::new().with("status", Predicate::one_of("status", ["ÜNPAID", "x"]));
    assert_eq!(ids(&apply_filters(&all, &one_of)), vec![1]);

    assert_eq!(ids(&apply_search(&all, &SearchQuery::new("ünpaid"))), vec![1]);
}

#[test]
fn date_range_is_inclusive_and_rejects_unparseable_dates() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let from = NaiveDate::from_ymd_opt(2024, 1, 15);
    let to = NaiveDate::from_ymd_opt(2024, 2, 10);
    let filters = FilterSet::new().with("issued", Predicate::date_range("issued", from, to));

    assert_eq!(ids(&apply_filters(&all, &filters)), vec![2, 3]);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let rows = records(json!([
        {"id": 0, "status": "b"},
        {"id": 1, "status": "a"},
        {"id": 2, "status": "b"},
        {"id": 3, "status": "a"},
        {"id": 4, "status": "b"},
        {"id": 5, "status": "a"}
    ]));
    let all: Vec<&Record> = rows.iter().collect();

    let ascending = apply_sort(&all, &SortKey::ascending("status"));
    assert_eq!(ids(&ascending), vec![1, 3, 5, 0, 2, 4]);

    let descending = apply_sort(&all, &SortKey::descending("status"));
    assert_eq!(ids(&descending), vec![0, 2, 4, 1, 3, 5]);

    let resorted = apply_sort(&ascending, &SortKey::ascending("status"));
    assert_eq!(ids(&resorted), ids(&ascending));
}

#[test]
fn sort_compares_numbers_numerically_and_dates_chronologically() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();

    let by_total = apply_sort(&all, &SortKey::ascending("total"));
    assert_eq!(ids(&by_total), vec![2, 5, 3, 1, 4]);

    let by_issued = apply_sort(&all, &SortKey::ascending("issued"));
    assert_eq!(ids(&by_issued), vec![5, 2, 3, 1, 4]);

    let by_issued_desc = apply_sort(&all, &SortKey::descending("issued"));
    assert_eq!(ids(&by_issued_desc), vec![1, 3, 2, 5, 4]);
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut all = Vec::new();
    for (position, &first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(position);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            all.push(tail);
        }
    }
    all
}

#[test]
fn mixed_column_sorts_identically_from_every_input_order() {
    let rows = records(json!([
        {"id": 1, "code": "10"},
        {"id": 2, "code": "9"},
        {"id": 3, "code": "1a"},
        {"id": 4, "code": 2},
        {"id": 5, "code": "B"},
        {"id": 6}
    ]));

    for key in [SortKey::ascending("code"), SortKey::descending("code")] {
        let mut outputs = Vec::new();
        for order in permutations(&[0, 1, 2, 3, 4, 5]) {
            let input: Vec<&Record> = order.iter().map(|&index| &rows[index]).collect();
            outputs.push(ids(&apply_sort(&input, &key)));
        }
        let expected = match key.direction {
            SortDirection::Ascending => vec![1, 3, 4, 2, 5, 6],
            SortDirection::Descending => vec![5, 2, 4, 3, 1, 6],
        };
        assert!(
            outputs.iter().all(|output| *output == expected),
            "{key}: {outputs:?}"
        );
    }
}

#[test]
fn one_non_numeric_value_switches_the_column_to_text() {
    let rows = records(json!([
        {"id": 1, "code": "10"},
        {"id": 2, "code": "9"},
        {"id": 3, "code": "n/a"}
    ]));
    let all: Vec<&Record> = rows.iter().collect();
    let numeric: Vec<&Record> = all[..2].to_vec();

    assert_eq!(ids(&apply_sort(&numeric, &SortKey::ascending("code"))), vec![2, 1]);
    assert_eq!(ids(&apply_sort(&all, &SortKey::ascending("code"))), vec![1, 2, 3]);
}

#[test]
fn sort_does_not_mutate_source() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let _ = apply_sort(&all, &SortKey::descending("total"));

    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
}

#[test]
fn parses_sort_keys() {
    assert_eq!(SortKey::parse("total").expect("parse"), SortKey::ascending("total"));
    assert_eq!(
        SortKey::parse("client.name:DESC").expect("parse"),
        SortKey::descending("client.name")
    );
    assert_eq!(
        SortKey::parse("total:desc").expect("parse").direction,
        SortDirection::Descending
    );

    for malformed in ["", ":asc", "total:sideways", "total:asc:extra", "client..name"] {
        assert!(
            matches!(
                SortKey::parse(malformed),
                Err(DashboardError::InvalidConfiguration(_))
            ),
            "expected rejection for {malformed:?}"
        );
    }
}

#[test]
fn pages_cover_every_record_exactly_once() {
    let rows: Vec<Record> = (0..23)
        .map(|id| Record::from_value(json!({"id": id, "rank": id % 4})).expect("object"))
        .collect();
    let all: Vec<&Record> = rows.iter().collect();
    let ordered = apply_sort(&all, &SortKey::ascending("rank"));

    for page_size in [1, 2, 5, 7, 10, 23, 50] {
        let first = paginate(&ordered, 0, page_size).expect("page");
        let mut rebuilt = Vec::new();
        for page_index in 0..first.total_pages {
            rebuilt.extend(paginate(&ordered, page_index, page_size).expect("page").items);
        }
        assert_eq!(ids(&rebuilt), ids(&ordered), "page size {page_size}");
    }
}

#[test]
fn paginate_clamps_out_of_range_index() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();

    let page = paginate(&all, 9, 2).expect("page");
    assert_eq!(page.page_index, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(ids(&page.items), vec![5]);
    assert!(page.has_prev);
    assert!(!page.has_next);

    let first = paginate(&all, 0, 2).expect("page");
    assert!(first.has_next);
    assert!(!first.has_prev);
}

#[test]
fn paginate_empty_collection_yields_single_empty_page() {
    let empty: Vec<&Record> = Vec::new();
    let page = paginate(&empty, 4, 10).expect("page");

    assert!(page.is_empty());
    assert_eq!(page.page_index, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.has_next);
    assert!(!page.has_prev);
}

#[test]
fn page_serializes_with_records_inline() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();
    let page = paginate(&all, 2, 2).expect("page");

    let value = serde_json::to_value(&page).expect("serialize page");
    assert_eq!(value["page_index"], json!(2));
    assert_eq!(value["total_pages"], json!(3));
    assert_eq!(value["has_next"], json!(false));
    assert_eq!(value["items"][0]["status"], json!("paid"));
}

#[test]
fn zero_page_size_is_invalid() {
    let rows = invoices();
    let all: Vec<&Record> = rows.iter().collect();

    assert!(matches!(
        paginate(&all, 0, 0),
        Err(DashboardError::InvalidConfiguration(_))
    ));
}
