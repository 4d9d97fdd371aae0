use std::sync::Arc;

use roster::config::AppConfig;
use roster::domain::member::{Member, MEMBER};
use roster::domain::persistence::{
    PersistenceContext, PersistenceError, PersistenceResult, QueryExecutor,
};
use roster::domain::repositories::MemberRepository;
use roster::domain::team::Team;
use roster::infrastructure::persistence::{InMemoryContext, PostgresContext};
use roster::infrastructure::repositories::{PostgresMemberRepository, QueryMemberRepository};
use roster::query::QueryFactory;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();

    let seed = match Seed::build() {
        Ok(seed) => seed,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build the sample roster");
            std::process::exit(1);
        }
    };

    let outcome = match config.database_url.as_deref() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let context = match PostgresContext::connect(database_url, config.max_connections).await
            {
                Ok(context) => Arc::new(context),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database");
                    std::process::exit(1);
                }
            };
            tracing::info!("Database connected successfully");

            match context.migrate().await {
                Ok(()) => {
                    let repository = PostgresMemberRepository::new(context.clone());
                    run(context, &repository, seed).await
                }
                Err(e) => Err(e),
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let context = Arc::new(InMemoryContext::new());
            let repository = QueryMemberRepository::new(context.clone());
            run(context, &repository, seed).await
        }
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "Roster run failed");
        std::process::exit(1);
    }
}

/// Two teams with two members each
struct Seed {
    team_a: Team,
    team_b: Team,
    members: Vec<Member>,
}

impl Seed {
    fn build() -> Result<Self, String> {
        let (mut team_a, mut events) = Team::new("teamA")?;
        let (mut team_b, more) = Team::new("teamB")?;
        events.extend(more);

        let mut members = Vec::new();
        for (name, age) in [("member1", 10), ("member2", 20)] {
            let (member, event) = Member::with_team(name, age, &mut team_a);
            events.push(event);
            members.push(member);
        }
        for (name, age) in [("member3", 30), ("member4", 40)] {
            let (member, event) = Member::with_team(name, age, &mut team_b);
            events.push(event);
            members.push(member);
        }

        for event in &events {
            tracing::debug!(team_id = %event.team_id(), ?event, "Team event");
        }

        Ok(Self {
            team_a,
            team_b,
            members,
        })
    }
}

/// Stores the seed, then runs the lookups
async fn run<C>(
    context: Arc<C>,
    repository: &dyn MemberRepository,
    seed: Seed,
) -> PersistenceResult<()>
where
    C: PersistenceContext + QueryExecutor<Member>,
{
    let Seed {
        team_a,
        team_b,
        members,
    } = seed;

    context.begin().await?;
    let saved = save_all(context.as_ref(), repository, &[&team_a, &team_b], &members).await;
    finish_session(context.as_ref(), saved).await?;

    let by_name = repository.find_by_user_name("member1").await?;
    tracing::info!(count = by_name.len(), "Members named member1");

    let queries = QueryFactory::new(context.as_ref());
    let found = queries
        .select_from(MEMBER)
        .filter([MEMBER.user_name.eq("member1"), MEMBER.age.eq(10)])
        .filter(MEMBER.team.eq(team_a.id()))
        .fetch_one()
        .await?;

    if let Some(member) = &found {
        let team = match member.team_id() {
            Some(team_id) => context.find_team(team_id).await?,
            None => None,
        };
        tracing::info!(
            member = %to_json(member),
            team = team.as_ref().map(Team::name).unwrap_or("-"),
            "Found member1 with the query builder"
        );
    }

    let seniors = queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team_b.id()).and(MEMBER.age.goe(30)))
        .fetch_count()
        .await?;
    tracing::info!(count = seniors, "Members of teamB aged 30 or more");

    match queries
        .select_from(MEMBER)
        .filter(MEMBER.team.eq(team_a.id()))
        .fetch_one()
        .await
    {
        Err(PersistenceError::NonUniqueResult { count, .. }) => {
            tracing::info!(count, "fetch_one over teamA is ambiguous, as expected");
        }
        other => {
            tracing::warn!(outcome = ?other.map(|m| m.map(|m| m.id())), "Unexpected fetch_one outcome");
        }
    }

    let everyone = repository.find_all().await?;
    tracing::info!(count = everyone.len(), "Members stored");

    Ok(())
}

async fn save_all<C>(
    context: &C,
    repository: &dyn MemberRepository,
    teams: &[&Team],
    members: &[Member],
) -> PersistenceResult<()>
where
    C: PersistenceContext,
{
    for team in teams {
        context.persist_team(team).await?;
    }
    for member in members {
        repository.save(member).await?;
    }
    Ok(())
}

/// Commits after a successful save, otherwise rolls back
///
/// A failed save is reported as is; a rollback failure on top of it is only logged.
async fn finish_session<C>(context: &C, saved: PersistenceResult<()>) -> PersistenceResult<()>
where
    C: PersistenceContext,
{
    match saved {
        Ok(()) => context.commit().await,
        Err(e) => {
            if let Err(rollback_error) = context.rollback().await {
                tracing::error!(error = %rollback_error, "Failed to roll back session");
            }
            Err(e)
        }
    }
}

fn to_json(member: &Member) -> String {
    serde_json::to_string(member).unwrap_or_else(|_| member.user_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_save_keeps_its_error_when_rollback_fails() {
        // No session is open, so the rollback itself fails.
        let context = InMemoryContext::new();
        let saved = Err(PersistenceError::MissingReference {
            table: "team",
            id: "missing".to_string(),
        });

        let result = finish_session(&context, saved).await;

        assert!(
            matches!(result, Err(PersistenceError::MissingReference { table: "team", .. })),
            "Original save error should be returned: {:?}",
            result
        );
    }

    #[tokio::test]
    async fn failed_save_rolls_back_open_session() {
        let context = InMemoryContext::new();
        context.begin().await.unwrap();

        let result = finish_session(&context, Err(PersistenceError::NoActiveSession)).await;

        assert!(matches!(result, Err(PersistenceError::NoActiveSession)));
        assert!(context.begin().await.is_ok(), "Session should have been closed");
    }

    #[tokio::test]
    async fn successful_save_commits() {
        let context = InMemoryContext::new();
        let seed = Seed::build().unwrap();
        context.begin().await.unwrap();
        context.persist_team(&seed.team_a).await.unwrap();

        finish_session(&context, Ok(())).await.unwrap();

        assert!(context.find_team(seed.team_a.id()).await.unwrap().is_some());
    }
}
