use medley_db::{
    create_pool, run_menu_migrations, run_trivia_migrations, run_venues_migrations,
    DbRuntimeSettings,
};

fn table_names(conn: &rusqlite::Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .expect("failed to prepare table name query");
    stmt.query_map([], |row| row.get(0))
        .expect("failed to execute table name query")
        .map(|r| r.expect("failed to read table name"))
        .collect()
}

#[test]
fn venues_db_initialization_works() {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    let applied = run_venues_migrations(&conn).expect("failed to run migrations");
    assert_eq!(applied, 1);

    assert_eq!(
        table_names(&conn),
        vec!["_medley_migrations", "artists", "shows", "venues"]
    );
}

#[test]
fn trivia_db_initialization_works() {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    let applied = run_trivia_migrations(&conn).expect("failed to run migrations");
    assert_eq!(applied, 2);

    assert_eq!(
        table_names(&conn),
        vec!["_medley_migrations", "categories", "questions"]
    );
}

#[test]
fn menu_db_initialization_works() {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    let applied = run_menu_migrations(&conn).expect("failed to run migrations");
    assert_eq!(applied, 1);

    assert_eq!(table_names(&conn), vec!["_medley_migrations", "drinks"]);
}

#[test]
fn foreign_keys_enforced_through_pool() {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    run_venues_migrations(&conn).expect("failed to run migrations");

    // A show referencing nonexistent rows must be rejected.
    let result = conn.execute(
        "INSERT INTO shows (artist_id, venue_id, start_time) VALUES (999, 999, '2026-01-01T20:00:00Z')",
        [],
    );
    assert!(result.is_err(), "orphan show insert should fail");
}
