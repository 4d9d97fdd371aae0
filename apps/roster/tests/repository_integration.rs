//! Integration tests for the repository layer
//!
//! These tests verify that both member repositories and the builder work
//! against a real PostgreSQL database, including transaction handling and
//! foreign key checks. They need `DATABASE_URL` and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/roster_test cargo test -- --ignored
//! ```

use std::sync::Arc;

use roster::domain::member::{Member, MEMBER};
use roster::domain::persistence::{PersistenceContext, PersistenceError};
use roster::domain::repositories::MemberRepository;
use roster::domain::team::{Team, TEAM};
use roster::infrastructure::persistence::PostgresContext;
use roster::infrastructure::repositories::{PostgresMemberRepository, QueryMemberRepository};
use roster::query::QueryFactory;
use sqlx::PgPool;
use uuid::Uuid;

/// Set up test database connection pool and schema
async fn setup_test_db() -> Arc<PostgresContext> {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    let context = PostgresContext::new(pool);
    context.migrate().await.expect("Failed to create schema");
    Arc::new(context)
}

/// Name that no other test run uses, so tests can share one database
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Stores one team with two members aged 10 and 20
async fn seed_team(context: &PostgresContext) -> (Team, Vec<Member>) {
    let (mut team, _) = Team::new(unique("team")).expect("valid team");
    let members = vec![
        Member::with_team(unique("member"), 10, &mut team).0,
        Member::with_team(unique("member"), 20, &mut team).0,
    ];

    context.begin().await.expect("begin transaction");
    context.persist_team(&team).await.expect("persist team");
    for member in &members {
        context.persist_member(member).await.expect("persist member");
    }
    context.commit().await.expect("commit transaction");

    (team, members)
}

/// Clean up test data after each test
async fn cleanup(context: &PostgresContext, team: &Team) {
    sqlx::query("DELETE FROM member WHERE team_id = $1")
        .bind(team.id())
        .execute(context.pool())
        .await
        .expect("Failed to cleanup members");
    sqlx::query("DELETE FROM team WHERE team_id = $1")
        .bind(team.id())
        .execute(context.pool())
        .await
        .expect("Failed to cleanup team");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_repository_find_by_user_name() {
    let context = setup_test_db().await;
    let (team, members) = seed_team(&context).await;
    let repository = PostgresMemberRepository::new(context.clone());

    let found = repository
        .find_by_user_name(members[0].user_name())
        .await
        .expect("Failed to find member by name");

    assert_eq!(found, vec![members[0].clone()], "Only the named member should match");

    let missing = repository
        .find_by_user_name(&unique("nobody"))
        .await
        .expect("Lookup should succeed");
    assert!(missing.is_empty(), "Unknown name should match nothing");

    cleanup(&context, &team).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_repository_find_by_id_and_all() {
    let context = setup_test_db().await;
    let (team, members) = seed_team(&context).await;
    let repository = PostgresMemberRepository::new(context.clone());

    let found = repository
        .find_by_id(members[1].id())
        .await
        .expect("Failed to find member by id");
    assert_eq!(found.as_ref(), Some(&members[1]));

    let all = repository.find_all().await.expect("Failed to list members");
    assert!(
        members.iter().all(|m| all.contains(m)),
        "find_all should include every seeded member"
    );

    cleanup(&context, &team).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_query_repository_matches_sql_repository() {
    let context = setup_test_db().await;
    let (team, members) = seed_team(&context).await;
    let sql_repository = PostgresMemberRepository::new(context.clone());
    let query_repository = QueryMemberRepository::new(context.clone());

    let by_sql = sql_repository
        .find_by_user_name(members[1].user_name())
        .await
        .expect("SQL lookup should succeed");
    let by_builder = query_repository
        .find_by_user_name(members[1].user_name())
        .await
        .expect("Builder lookup should succeed");

    assert_eq!(by_sql, by_builder);

    cleanup(&context, &team).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_builder_terminals() {
    let context = setup_test_db().await;
    let (team, members) = seed_team(&context).await;
    let queries = QueryFactory::new(context.as_ref());

    let youngest = queries
        .select_from(MEMBER)
        .filter([MEMBER.team.eq(team.id()), MEMBER.age.eq(10)])
        .fetch_one()
        .await
        .expect("fetch_one should succeed");
    assert_eq!(youngest.as_ref(), Some(&members[0]));

    let ambiguous = queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team.id()))
        .fetch_one()
        .await;
    assert!(
        matches!(ambiguous, Err(PersistenceError::NonUniqueResult { count: 2, .. })),
        "Two members should make fetch_one ambiguous: {:?}",
        ambiguous
    );

    let oldest = queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team.id()))
        .order_by(MEMBER.age.desc())
        .fetch_first()
        .await
        .expect("fetch_first should succeed");
    assert_eq!(oldest.as_ref(), Some(&members[1]));

    let count = queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team.id()).and(MEMBER.age.goe(15)))
        .fetch_count()
        .await
        .expect("fetch_count should succeed");
    assert_eq!(count, 1);

    let prefixed = queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team.id()))
        .filter(MEMBER.user_name.starts_with("member-"))
        .fetch_count()
        .await
        .expect("fetch_count should succeed");
    assert_eq!(prefixed, 2);

    cleanup(&context, &team).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_loaded_team_carries_member_index() {
    let context = setup_test_db().await;
    let (team, _) = seed_team(&context).await;

    let loaded = context
        .find_team(team.id())
        .await
        .expect("Failed to load team")
        .expect("Team should exist");
    assert_eq!(loaded.members(), team.members());

    let by_query = QueryFactory::new(context.as_ref())
        .select_from(TEAM)
        .filter(TEAM.name.eq(team.name()))
        .fetch()
        .await
        .expect("Team query should succeed");
    assert_eq!(by_query, vec![loaded]);

    cleanup(&context, &team).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_change_team_round_trip() {
    let context = setup_test_db().await;
    let (mut team_a, mut members) = seed_team(&context).await;
    let (mut team_b, _) = Team::new(unique("team")).expect("valid team");
    let repository = QueryMemberRepository::new(context.clone());

    let member = &mut members[0];
    member
        .change_team(Some(&mut team_a), &mut team_b)
        .expect("valid move");

    context.begin().await.expect("begin transaction");
    context.persist_team(&team_b).await.expect("persist team");
    repository.save(member).await.expect("save member");
    context.commit().await.expect("commit transaction");

    let loaded_a = context.find_team(team_a.id()).await.expect("load").expect("exists");
    let loaded_b = context.find_team(team_b.id()).await.expect("load").expect("exists");
    assert_eq!(loaded_a.members(), team_a.members());
    assert_eq!(loaded_b.members(), team_b.members());
    assert!(loaded_b.contains(member.id()));

    cleanup(&context, &team_a).await;
    cleanup(&context, &team_b).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rollback_and_missing_reference() {
    let context = setup_test_db().await;
    let (mut orphan_team, _) = Team::new(unique("team")).expect("valid team");
    let (orphan, _) = Member::with_team(unique("member"), 30, &mut orphan_team);
    let repository = PostgresMemberRepository::new(context.clone());

    assert!(matches!(
        repository.save(&orphan).await,
        Err(PersistenceError::NoActiveSession)
    ));

    context.begin().await.expect("begin transaction");
    let result = repository.save(&orphan).await;
    context.rollback().await.expect("rollback transaction");

    assert!(
        matches!(result, Err(PersistenceError::MissingReference { table: "team", .. })),
        "Unknown team should be reported: {:?}",
        result
    );
    assert!(repository
        .find_by_id(orphan.id())
        .await
        .expect("Lookup should succeed")
        .is_none());
}
