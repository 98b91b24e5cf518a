use comments_core::db::open_db_in_memory;
use comments_core::{
    CommentService, CommentServiceError, DocumentStore, SqliteDocumentStore, User, UserId,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_user(conn: &Connection, name: &str) -> UserId {
    let store = SqliteDocumentStore::try_new(conn).unwrap();
    let user = User::new(name);
    store.insert_user(&user).unwrap();
    user.id
}

fn service(conn: &Connection) -> CommentService<SqliteDocumentStore<'_>> {
    CommentService::new(SqliteDocumentStore::try_new(conn).unwrap())
}

fn comment_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM comments;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_then_get_and_list() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);

    let created = service.create("hello", user).unwrap();
    assert_eq!(created.content, "hello");
    assert_eq!(created.creator, user);

    let loaded = service.get_by_id(created.id).unwrap();
    assert_eq!(loaded, created);

    let listed = service.list_by_user(user).unwrap();
    assert_eq!(listed, vec![created]);
}

#[test]
fn get_absent_comment_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.get_by_id(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, CommentServiceError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.message(), "Could not find comment for the provided id.");
}

#[test]
fn get_reports_store_errors_separately_from_absence() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    conn.execute_batch("ALTER TABLE comments RENAME TO comments_archived;")
        .unwrap();

    let err = service.get_by_id(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, CommentServiceError::StoreUnavailable { .. }));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn list_does_not_distinguish_unknown_user_from_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "quiet");
    let service = service(&conn);

    let unknown = service.list_by_user(Uuid::new_v4()).unwrap_err();
    let empty = service.list_by_user(user).unwrap_err();
    assert!(matches!(unknown, CommentServiceError::NotFound(_)));
    assert!(matches!(empty, CommentServiceError::NotFound(_)));
    assert_eq!(unknown.message(), empty.message());
}

#[test]
fn list_returns_only_the_users_comments_in_order() {
    let conn = open_db_in_memory().unwrap();
    let ada = seed_user(&conn, "ada");
    let bob = seed_user(&conn, "bob");
    let service = service(&conn);

    let first = service.create("first", ada).unwrap();
    service.create("other", bob).unwrap();
    let second = service.create("second", ada).unwrap();

    let listed: Vec<_> = service
        .list_by_user(ada)
        .unwrap()
        .into_iter()
        .map(|comment| comment.id)
        .collect();
    assert_eq!(listed, vec![first.id, second.id]);
}

#[test]
fn create_for_unknown_user_is_not_found_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create("hello", Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, CommentServiceError::NotFound(_)));
    assert_eq!(err.message(), "Could not find user for provided id.");
    assert_eq!(comment_rows(&conn), 0);
}

#[test]
fn create_rejects_empty_content() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);

    let err = service.create("", user).unwrap_err();
    assert!(matches!(err, CommentServiceError::ValidationFailed(_)));
    assert_eq!(err.status_code(), 422);
    assert_eq!(comment_rows(&conn), 0);
}

#[test]
fn whitespace_only_content_is_stored_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);

    let created = service.create("  \t", user).unwrap();
    assert_eq!(service.get_by_id(created.id).unwrap().content, "  \t");

    let updated = service.update(created.id, " ", user).unwrap();
    assert_eq!(updated.content, " ");
}

#[test]
fn failed_collection_append_leaves_no_orphan_comment() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    conn.execute_batch(
        "CREATE TRIGGER fail_collection_append
         BEFORE INSERT ON user_comments
         BEGIN
             SELECT RAISE(ABORT, 'collection append rejected');
         END;",
    )
    .unwrap();
    let service = service(&conn);

    let err = service.create("hello", user).unwrap_err();
    assert!(matches!(err, CommentServiceError::WriteFailed { .. }));
    assert_eq!(err.message(), "Creating comment failed, please try again.");
    assert_eq!(comment_rows(&conn), 0);
    assert!(matches!(
        service.list_by_user(user).unwrap_err(),
        CommentServiceError::NotFound(_)
    ));
}

#[test]
fn update_by_creator_replaces_content() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);
    let created = service.create("hello", user).unwrap();

    let updated = service.update(created.id, "hello world", user).unwrap();
    assert_eq!(updated.content, "hello world");
    assert_eq!(updated.creator, user);
    assert_eq!(service.get_by_id(created.id).unwrap().content, "hello world");
}

#[test]
fn update_by_other_user_is_forbidden_and_keeps_content() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "ada");
    let intruder = seed_user(&conn, "eve");
    let service = service(&conn);
    let created = service.create("hello", owner).unwrap();

    let err = service.update(created.id, "defaced", intruder).unwrap_err();
    assert!(matches!(err, CommentServiceError::Forbidden(_)));
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "You are not allowed to edit this comment.");
    assert_eq!(service.get_by_id(created.id).unwrap().content, "hello");
}

#[test]
fn update_absent_comment_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);

    let err = service.update(Uuid::new_v4(), "text", user).unwrap_err();
    assert!(matches!(err, CommentServiceError::NotFound(_)));
}

#[test]
fn delete_by_creator_removes_comment_and_collection_entry() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);
    let keep = service.create("keep", user).unwrap();
    let gone = service.create("gone", user).unwrap();

    service.delete(gone.id, user).unwrap();

    assert!(matches!(
        service.get_by_id(gone.id).unwrap_err(),
        CommentServiceError::NotFound(_)
    ));
    assert_eq!(service.list_by_user(user).unwrap(), vec![keep]);
    let owner = service.store().find_user(user).unwrap().unwrap();
    assert!(!owner.comments.contains(&gone.id));
}

#[test]
fn delete_by_other_user_is_forbidden() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "ada");
    let intruder = seed_user(&conn, "eve");
    let service = service(&conn);
    let created = service.create("hello", owner).unwrap();

    let err = service.delete(created.id, intruder).unwrap_err();
    assert!(matches!(err, CommentServiceError::Forbidden(_)));
    assert_eq!(err.message(), "You are not allowed to delete this comment.");
    assert_eq!(service.get_by_id(created.id).unwrap(), created);
}

#[test]
fn delete_absent_comment_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);

    let err = service.delete(Uuid::new_v4(), user).unwrap_err();
    assert!(matches!(err, CommentServiceError::NotFound(_)));
    assert_eq!(err.message(), "Could not find comment for this id.");
}

#[test]
fn failed_collection_pull_keeps_comment_and_entry() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);
    let created = service.create("sticky", user).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_collection_pull
         BEFORE DELETE ON user_comments
         BEGIN
             SELECT RAISE(ABORT, 'collection pull rejected');
         END;",
    )
    .unwrap();

    let err = service.delete(created.id, user).unwrap_err();
    assert!(matches!(err, CommentServiceError::WriteFailed { .. }));
    assert_eq!(service.get_by_id(created.id).unwrap(), created.clone());
    assert_eq!(service.list_by_user(user).unwrap(), vec![created]);
}

#[test]
fn delete_folds_lookup_errors_into_write_failed() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ada");
    let service = service(&conn);
    conn.execute_batch("ALTER TABLE comments RENAME TO comments_archived;")
        .unwrap();

    let err = service.delete(Uuid::new_v4(), user).unwrap_err();
    assert!(matches!(err, CommentServiceError::WriteFailed { .. }));
    assert_eq!(err.message(), "Something went wrong, could not delete comment.");
}
