use rusqlite::Connection;
use semantic_meta_core::db::{open_db, open_db_in_memory};
use semantic_meta_core::{
    CatalogEntity, Metric, MetricRepository, MetricType, NameIdentifier, Namespace,
    SimpleEntityRepository, SqliteMetricRepository, SqliteNamespaceResolver, StoreError,
    StoreResult, WordRoot, WordRootRepository,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

fn sales() -> Namespace {
    Namespace::new("lake", "dw", "sales").unwrap()
}

fn word_roots(conn: &Connection) -> WordRootRepository<'_, SqliteNamespaceResolver<'_>> {
    WordRootRepository::try_new(conn, SqliteNamespaceResolver::new(conn)).unwrap()
}

fn metrics(conn: &Connection) -> SqliteMetricRepository<'_, SqliteNamespaceResolver<'_>> {
    SqliteMetricRepository::try_new(conn, SqliteNamespaceResolver::new(conn)).unwrap()
}

/// Runs `worker` on two threads with their own connections and returns
/// both results.
fn race<T, F>(path: &Path, worker: F) -> Vec<StoreResult<T>>
where
    T: Send + 'static,
    F: Fn(&Connection, &Barrier) -> StoreResult<T> + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(2));
    let worker = Arc::new(worker);
    let handles = (0..2)
        .map(|_| {
            let path = path.to_path_buf();
            let barrier = Arc::clone(&barrier);
            let worker = Arc::clone(&worker);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                worker(&conn, &barrier)
            })
        })
        .collect::<Vec<_>>();
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn write_between_read_and_swap_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let ns = sales();
    SqliteNamespaceResolver::new(&conn)
        .ensure_namespace(&ns)
        .unwrap();
    let repo = word_roots(&conn);
    repo.insert(&WordRoot::new(ns.clone(), "amt", "amount"), false)
        .unwrap();
    let ident = NameIdentifier::new(ns, "amt");

    let outer = repo.update(&ident, |mut root| {
        repo.update(&ident, |mut inner| {
            inner.comment = Some("inner".to_string());
            inner
        })
        .unwrap();
        root.comment = Some("outer".to_string());
        root
    });

    assert!(matches!(
        outer.unwrap_err(),
        StoreError::Conflict {
            resource: "word_root",
            ..
        }
    ));
    assert_eq!(repo.get(&ident).unwrap().comment.as_deref(), Some("inner"));
}

#[test]
fn metric_pointer_move_during_update_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let ns = sales();
    SqliteNamespaceResolver::new(&conn)
        .ensure_namespace(&ns)
        .unwrap();
    let repo = metrics(&conn);
    let ident = repo
        .insert(&Metric::new(ns, "REVENUE", "revenue", MetricType::Atomic), false)
        .unwrap()
        .name_identifier();
    repo.update(&ident, |mut metric| {
        metric.fields.unit = Some("USD".to_string());
        metric
    })
    .unwrap();

    let outer = repo.update(&ident, |mut metric| {
        repo.switch_current_version(&ident, 1).unwrap();
        metric.fields.unit = Some("EUR".to_string());
        metric
    });

    assert!(matches!(outer.unwrap_err(), StoreError::Conflict { .. }));
    let stored = repo.get(&ident).unwrap();
    assert_eq!(stored.current_version, 1);
    assert_eq!(stored.last_version, 2);
    assert_eq!(repo.list_versions(&ident).unwrap().len(), 2);
}

#[test]
fn racing_updates_on_two_connections_let_exactly_one_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");
    {
        let conn = open_db(&path).unwrap();
        let ns = sales();
        SqliteNamespaceResolver::new(&conn)
            .ensure_namespace(&ns)
            .unwrap();
        word_roots(&conn)
            .insert(&WordRoot::new(ns, "amt", "amount"), false)
            .unwrap();
    }

    let results = race(&path, |conn, barrier| {
        let repo = word_roots(conn);
        repo.update(&NameIdentifier::new(sales(), "amt"), |mut root| {
            // Both snapshots are taken before either writer commits.
            barrier.wait();
            root.comment = Some(format!("{:?}", thread::current().id()));
            root
        })
    });

    let winners = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(StoreError::Conflict { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);

    let conn = open_db(&path).unwrap();
    let winner = results.into_iter().find_map(Result::ok).unwrap();
    let stored = word_roots(&conn)
        .get(&NameIdentifier::new(sales(), "amt"))
        .unwrap();
    assert_eq!(stored.comment, winner.comment);
}

#[test]
fn racing_version_changes_allocate_one_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");
    {
        let conn = open_db(&path).unwrap();
        let ns = sales();
        SqliteNamespaceResolver::new(&conn)
            .ensure_namespace(&ns)
            .unwrap();
        metrics(&conn)
            .insert(&Metric::new(ns, "REVENUE", "revenue", MetricType::Atomic), false)
            .unwrap();
    }

    let results = race(&path, |conn, barrier| {
        let repo = metrics(conn);
        repo.update(&NameIdentifier::new(sales(), "REVENUE"), |mut metric| {
            barrier.wait();
            metric.fields.calculation_formula =
                Some(format!("SUM(amount) /* {:?} */", thread::current().id()));
            metric
        })
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|result| matches!(result, Err(StoreError::Conflict { .. }))));

    let conn = open_db(&path).unwrap();
    let repo = metrics(&conn);
    let ident = NameIdentifier::new(sales(), "REVENUE");
    let stored = repo.get(&ident).unwrap();
    assert_eq!(stored.current_version, 2);
    assert_eq!(stored.last_version, 2);

    let versions = repo.list_versions(&ident).unwrap();
    assert_eq!(
        versions.iter().map(|version| version.version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    let winner = results.into_iter().find_map(Result::ok).unwrap();
    assert_eq!(versions[1].fields, winner.fields);
}
