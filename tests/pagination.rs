use global_usage::db::Db;
use global_usage::usage_links::insert_usage_rows;
use global_usage::usage_query::{
    self, Direction, UsageCursor, UsageQueryBuilder, UsageRecord, UsageResultSet, UsageTarget,
};
use global_usage::UsageError;
use pretty_assertions::assert_eq;

fn record(target: &str, site: &str, page_id: i64) -> UsageRecord {
    UsageRecord {
        target: target.to_string(),
        site: site.to_string(),
        page_id,
        page_namespace_id: 0,
        page_namespace: String::new(),
        page_title: format!("{site}_page_{page_id}"),
    }
}

fn seeded_db(dir: &tempfile::TempDir, rows: &[UsageRecord]) -> Db {
    let db = Db::init(&dir.path().join("usage.db")).expect("init db");
    let mut conn = db.open_connection().expect("conn");
    insert_usage_rows(&mut conn, rows).expect("seed");
    db
}

fn dataset() -> Vec<UsageRecord> {
    let mut rows = Vec::new();
    for target in ["Alpha.jpg", "Beta.svg"] {
        for (site, pages) in [("dewiki", 3), ("enwiki", 4), ("frwiki", 2)] {
            for page_id in 1..=pages {
                rows.push(record(target, site, page_id * 10));
            }
        }
    }
    rows
}

fn fetch(db: &Db, builder: &UsageQueryBuilder) -> UsageResultSet {
    usage_query::execute(db, &builder.build().expect("config")).expect("execute")
}

fn all_files() -> UsageTarget {
    UsageTarget::files(["Alpha.jpg", "Beta.svg"])
}

fn flatten(set: &UsageResultSet) -> Vec<UsageCursor> {
    set.records().map(UsageRecord::key).collect()
}

#[test]
fn forward_walk_visits_every_row_once_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows = dataset();
    let db = seeded_db(&dir, &rows);

    let mut expected: Vec<UsageCursor> = rows.iter().map(UsageRecord::key).collect();
    expected.sort();

    for limit in [1_i64, 4, 9, 18, 50] {
        let mut builder = UsageQueryBuilder::new(all_files());
        builder.set_limit(limit);

        let mut seen = Vec::new();
        loop {
            let page = fetch(&db, &builder);
            let keys = flatten(&page);
            assert!(keys.windows(2).all(|w| w[0] < w[1]));
            seen.extend(keys);
            if !page.has_more() {
                break;
            }
            let token = page.continuation_token();
            builder
                .set_cursor(&token, Some(Direction::Forward))
                .expect("valid token");
        }
        assert_eq!(seen, expected, "limit {limit}");
    }
}

#[test]
fn backward_from_forward_cursor_returns_preceding_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows = dataset();
    let db = seeded_db(&dir, &rows);
    let mut ordered: Vec<UsageCursor> = rows.iter().map(UsageRecord::key).collect();
    ordered.sort();

    let mut builder = UsageQueryBuilder::new(all_files());
    builder.set_limit(7);
    let first = fetch(&db, &builder);
    let token = first.continuation_token();
    assert_eq!(token, ordered[7].to_string());

    let mut back = UsageQueryBuilder::new(all_files());
    back.set_limit(7)
        .set_cursor(&token, Some(Direction::Backward))
        .expect("valid token");
    let page = fetch(&db, &back);

    assert_eq!(flatten(&page), ordered[..7].to_vec());
    assert_eq!(page.direction(), Direction::Backward);
    assert!(!page.has_more());
    assert_eq!(flatten(&page), flatten(&first));
}

#[test]
fn oversized_and_zero_limits_are_clamped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seeded_db(&dir, &dataset());

    let page_of = |limit: i64| {
        let mut builder = UsageQueryBuilder::new(all_files());
        builder.set_limit(limit);
        let set = fetch(&db, &builder);
        (set.limit(), flatten(&set), set.continuation_token())
    };

    assert_eq!(page_of(0), page_of(1));
    assert_eq!(page_of(-3).0, 1);
    assert_eq!(page_of(10_000), page_of(500));
}

#[test]
fn site_filter_counts_surfaced_targets_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut rows = vec![record("Alpha.jpg", "enwiki", 1), record("Alpha.jpg", "enwiki", 2)];
    rows.push(record("Beta.svg", "dewiki", 1));
    let db = seeded_db(&dir, &rows);

    let mut builder = UsageQueryBuilder::new(all_files());
    builder.filter_sites(["enwiki"]);
    let set = fetch(&db, &builder);

    assert_eq!(set.count(), 1);
    assert_eq!(set.row_count(), 2);
    assert!(set.records().all(|r| r.site == "enwiki"));
}

#[test]
fn concrete_scenario_pages_through_foo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = seeded_db(
        &dir,
        &[
            record("Foo.png", "siteA", 1),
            record("Foo.png", "siteA", 2),
            record("Foo.png", "siteB", 1),
            record("Foo.png", "siteC", 5),
            record("Foo.png", "siteC", 9),
        ],
    );
    let mut builder = UsageQueryBuilder::new(UsageTarget::file("Foo.png").expect("target"));
    builder.set_limit(2);

    let mut tokens = Vec::new();
    let mut sizes = Vec::new();
    loop {
        let page = fetch(&db, &builder);
        sizes.push(page.row_count());
        if !page.has_more() {
            assert_eq!(page.continuation_token(), "");
            break;
        }
        let token = page.continuation_token();
        builder.set_cursor(&token, None).expect("valid token");
        tokens.push(token);
    }

    assert_eq!(tokens, vec!["Foo.png|siteB|1", "Foo.png|siteC|9"]);
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[test]
fn malformed_cursor_leaves_builder_untouched() {
    let mut builder = UsageQueryBuilder::new(UsageTarget::File("Foo.png".to_string()));
    builder
        .set_cursor("Foo.png|siteB|1", Some(Direction::Forward))
        .expect("valid token");

    let err = builder
        .set_cursor("a|b", Some(Direction::Backward))
        .unwrap_err();
    assert!(matches!(err, UsageError::MalformedCursor(_)));
    assert_eq!(
        builder.cursor(),
        Some(&UsageCursor::new("Foo.png", "siteB", 1))
    );
    assert_eq!(builder.direction(), Direction::Forward);
}

#[test]
fn cursor_token_round_trips() {
    let cursor = UsageCursor::new("Some_file.png", "enwiki", 42);
    let parsed: UsageCursor = cursor.to_string().parse().expect("parse");
    assert_eq!(parsed, cursor);
}
