use chrono::Duration;
use quiz_core::model::{AnswerEvent, QuestionId, UserId, UserName};
use quiz_core::time::fixed_now;
use storage::repository::{
    AnswerEventRepository, QuestionIndexEntry, QuestionIndexRepository, StorageError,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn name(raw: &str) -> UserName {
    UserName::new(raw).unwrap()
}

#[tokio::test]
async fn sqlite_user_registration_is_idempotent() {
    let repo = connect("memdb_users").await;

    let ana = repo.insert_user_if_absent(&name("ana")).await.unwrap();
    let bo = repo.insert_user_if_absent(&name("bo")).await.unwrap();
    for _ in 0..3 {
        let again = repo.insert_user_if_absent(&name("ana")).await.unwrap();
        assert_eq!(again, ana);
    }

    let users = repo.list_users().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.name().as_str()).collect();
    assert_eq!(names, vec!["ana", "bo"]);
    assert_eq!(repo.find_user(&name("bo")).await.unwrap().unwrap().id(), bo);
    assert!(repo.find_user(&name("cy")).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_question_index_keeps_first_source() {
    let repo = connect("memdb_question_index").await;

    let first = repo
        .register_sources(&[
            QuestionIndexEntry::new(QuestionId::new(1), "a.json"),
            QuestionIndexEntry::new(QuestionId::new(2), "a.json"),
        ])
        .await
        .unwrap();
    assert_eq!(first, 2);

    let second = repo
        .register_sources(&[
            QuestionIndexEntry::new(QuestionId::new(2), "b.json"),
            QuestionIndexEntry::new(QuestionId::new(3), "b.json"),
        ])
        .await
        .unwrap();
    assert_eq!(second, 1);

    assert_eq!(
        repo.source_of(QuestionId::new(2)).await.unwrap().as_deref(),
        Some("a.json")
    );
    assert_eq!(
        repo.source_of(QuestionId::new(3)).await.unwrap().as_deref(),
        Some("b.json")
    );
    assert!(repo.source_of(QuestionId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_answer_log_appends_and_joins_names() {
    let repo = connect("memdb_answers").await;
    let ana = repo.insert_user_if_absent(&name("ana")).await.unwrap();
    let bo = repo.insert_user_if_absent(&name("bo")).await.unwrap();

    let now = fixed_now();
    repo.append_event(&AnswerEvent::new(ana, QuestionId::new(1), true, now))
        .await
        .unwrap();
    repo.append_event(&AnswerEvent::new(ana, QuestionId::new(1), false, now + Duration::minutes(1)))
        .await
        .unwrap();
    repo.append_event(&AnswerEvent::new(bo, QuestionId::new(2), true, now + Duration::days(1)))
        .await
        .unwrap();

    let ana_events = repo.events_for_user(ana).await.unwrap();
    assert_eq!(ana_events.len(), 2);
    assert!(ana_events[0].correct);
    assert!(!ana_events[1].correct);
    assert_eq!(ana_events[0].answered_at, now);
    assert_eq!(ana_events[1].question_id, QuestionId::new(1));

    let named = repo.all_events_named().await.unwrap();
    assert_eq!(named.len(), 3);
    assert_eq!(named[2].user_name, "bo");
    assert_eq!(named[2].event.answered_at, now + Duration::days(1));
}

#[tokio::test]
async fn sqlite_rejects_events_for_unknown_users() {
    let repo = connect("memdb_fk").await;
    let event = AnswerEvent::new(UserId::new(42), QuestionId::new(1), true, fixed_now());
    let err = repo.append_event(&event).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert!(repo.events_for_user(UserId::new(42)).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_reads_rows_written_with_column_default_timestamp() {
    let repo = connect("memdb_legacy_rows").await;
    let ana = repo.insert_user_if_absent(&name("ana")).await.unwrap();

    sqlx::query("INSERT INTO stats (user_id, question, correct) VALUES (?1, '7', 1)")
        .bind(i64::try_from(ana.value()).unwrap())
        .execute(repo.pool())
        .await
        .unwrap();

    let events = repo.events_for_user(ana).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].question_id, QuestionId::new(7));
    assert!(events[0].correct);
}

#[tokio::test]
async fn migrations_are_rerunnable() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 2);
}

#[tokio::test]
async fn sqlite_padded_legacy_names_match_their_trimmed_form() {
    let repo = connect("memdb_padded_names").await;
    let legacy = sqlx::query("INSERT INTO users (name) VALUES (' ana')")
        .execute(repo.pool())
        .await
        .unwrap()
        .last_insert_rowid();
    let legacy = UserId::new(u64::try_from(legacy).unwrap());

    assert_eq!(repo.find_user(&name("ana")).await.unwrap().unwrap().id(), legacy);
    assert_eq!(repo.insert_user_if_absent(&name("ana")).await.unwrap(), legacy);

    let users = repo.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name().as_str(), "ana");
    assert_eq!(users[0].id(), legacy);
}

#[tokio::test]
async fn sqlite_lists_padded_duplicates_once_under_the_oldest_id() {
    let repo = connect("memdb_padded_duplicates").await;
    sqlx::query("INSERT INTO users (name) VALUES ('bo '), ('bo'), ('ana')")
        .execute(repo.pool())
        .await
        .unwrap();

    let users = repo.list_users().await.unwrap();
    let listed: Vec<_> = users.iter().map(|u| (u.id(), u.name().as_str())).collect();
    assert_eq!(listed, vec![(UserId::new(1), "bo"), (UserId::new(3), "ana")]);
    assert_eq!(repo.insert_user_if_absent(&name("bo")).await.unwrap(), UserId::new(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_pools_on_one_file_share_registrations_and_answers() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("shared.db").display());
    let first = SqliteRepository::connect(&url).await.unwrap();
    first.migrate().await.unwrap();
    let second = SqliteRepository::connect(&url).await.unwrap();
    second.migrate().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..40_u64 {
        let repo = if i % 2 == 0 { first.clone() } else { second.clone() };
        handles.push(tokio::spawn(async move {
            let ana = repo.insert_user_if_absent(&name("ana")).await?;
            let event = AnswerEvent::new(ana, QuestionId::new(i), i % 3 == 0, fixed_now());
            repo.append_event(&event).await?;
            Ok::<_, StorageError>(ana)
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    assert_eq!(second.list_users().await.unwrap().len(), 1);
    assert_eq!(first.events_for_user(ids[0]).await.unwrap().len(), 40);
}
