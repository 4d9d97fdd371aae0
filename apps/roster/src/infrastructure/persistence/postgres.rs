use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::{Query as SqlQuery, QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::schema;
use crate::domain::member::{Member, MemberId};
use crate::domain::persistence::{
    PersistenceContext, PersistenceError, PersistenceResult, QueryExecutor,
};
use crate::domain::team::{Team, TeamId};
use crate::query::{Entity, Expr, Query, Value};

/// Entity that can be selected from PostgreSQL
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> {
    /// Columns (and derived columns) read by `FromRow`
    const SELECT_LIST: &'static str;
}

impl PgEntity for Member {
    const SELECT_LIST: &'static str = "member_id, user_name, age, team_id";
}

impl PgEntity for Team {
    const SELECT_LIST: &'static str = "team_id, name, \
        ARRAY(SELECT m.member_id FROM member m WHERE m.team_id = team.team_id) AS member_ids";
}

impl<'r> FromRow<'r, PgRow> for Member {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Member::from_persistence(
            row.try_get("member_id")?,
            row.try_get("user_name")?,
            row.try_get("age")?,
            row.try_get("team_id")?,
        ))
    }
}

impl<'r> FromRow<'r, PgRow> for Team {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let member_ids: Vec<Uuid> = row.try_get("member_ids")?;
        Ok(Team::from_persistence(
            row.try_get("team_id")?,
            row.try_get("name")?,
            member_ids.into_iter().map(MemberId::from_uuid),
        ))
    }
}

/// Renders a builder query as parameterised SQL
pub fn select_sql<E: PgEntity>(query: &Query<E>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", E::SELECT_LIST, E::TABLE));
    push_where(&mut builder, query.predicate());

    if !query.order().is_empty() {
        builder.push(" ORDER BY ");
        let mut separated = builder.separated(", ");
        for spec in query.order() {
            separated.push(format!("{} {}", spec.column(), spec.direction().sql()));
        }
    }
    if let Some(limit) = query.limit() {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    builder
}

/// Renders the row count of a builder query; order and limit are ignored
pub fn count_sql<E: PgEntity>(query: &Query<E>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
    push_where(&mut builder, query.predicate());
    builder
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, predicate: Option<Expr>) {
    if let Some(expr) = predicate {
        builder.push(" WHERE ");
        push_expr(builder, &expr);
    }
}

fn push_expr(builder: &mut QueryBuilder<'static, Postgres>, expr: &Expr) {
    match expr {
        Expr::Compare { column, op, value } => {
            builder.push(*column).push(" ").push(op.sql()).push(" ");
            push_value(builder, value);
        }
        Expr::Between { column, low, high } => {
            builder.push(*column).push(" BETWEEN ");
            push_value(builder, low);
            builder.push(" AND ");
            push_value(builder, high);
        }
        Expr::Text {
            column,
            mode,
            needle,
        } => {
            builder
                .push(*column)
                .push(" LIKE ")
                .push_bind(mode.like_pattern(needle));
        }
        Expr::IsNull { column, negated } => {
            builder
                .push(*column)
                .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Expr::And(parts) => push_group(builder, parts, " AND ", "TRUE"),
        Expr::Or(parts) => push_group(builder, parts, " OR ", "FALSE"),
        Expr::Not(inner) => {
            builder.push("NOT (");
            push_expr(builder, inner);
            builder.push(")");
        }
    }
}

fn push_group(
    builder: &mut QueryBuilder<'static, Postgres>,
    parts: &[Expr],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        builder.push(empty);
        return;
    }
    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_expr(builder, part);
    }
    builder.push(")");
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Int(v) => {
            builder.push_bind(*v);
        }
        Value::Text(v) => {
            builder.push_bind(v.clone());
        }
        Value::Uuid(v) => {
            builder.push_bind(*v);
        }
    }
}

/// PostgreSQL persistence context
///
/// Reads run on the open transaction when there is one, otherwise on the
/// pool. Writes require an open transaction.
pub struct PostgresContext {
    pool: PgPool,
    transaction: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PostgresContext {
    /// Creates a new PostgresContext
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
        }
    }

    /// Opens a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> PersistenceResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the team and member tables if they do not exist
    pub async fn migrate(&self) -> PersistenceResult<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Schema ready");
        Ok(())
    }

    /// Runs a hand-written select inside the session, or on the pool without one
    pub async fn fetch_all_as<E>(
        &self,
        query: QueryAs<'_, Postgres, E, PgArguments>,
    ) -> PersistenceResult<Vec<E>>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut transaction = self.transaction.lock().await;
        let rows = match transaction.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    pub async fn fetch_optional_as<E>(
        &self,
        query: QueryAs<'_, Postgres, E, PgArguments>,
    ) -> PersistenceResult<Option<E>>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut transaction = self.transaction.lock().await;
        let row = match transaction.as_mut() {
            Some(tx) => query.fetch_optional(&mut **tx).await?,
            None => query.fetch_optional(&self.pool).await?,
        };
        Ok(row)
    }

    async fn fetch_scalar(
        &self,
        query: QueryScalar<'_, Postgres, i64, PgArguments>,
    ) -> PersistenceResult<i64> {
        let mut transaction = self.transaction.lock().await;
        let value = match transaction.as_mut() {
            Some(tx) => query.fetch_one(&mut **tx).await?,
            None => query.fetch_one(&self.pool).await?,
        };
        Ok(value)
    }

    /// Runs a write on the open transaction
    async fn execute_in_session(
        &self,
        query: SqlQuery<'_, Postgres, PgArguments>,
    ) -> PersistenceResult<u64> {
        let mut transaction = self.transaction.lock().await;
        let tx = transaction
            .as_mut()
            .ok_or(PersistenceError::NoActiveSession)?;
        let result = query.execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PersistenceContext for PostgresContext {
    async fn begin(&self) -> PersistenceResult<()> {
        let mut transaction = self.transaction.lock().await;
        if transaction.is_some() {
            return Err(PersistenceError::SessionAlreadyActive);
        }
        *transaction = Some(self.pool.begin().await?);
        tracing::debug!("PostgreSQL transaction started");
        Ok(())
    }

    async fn commit(&self) -> PersistenceResult<()> {
        let tx = self
            .transaction
            .lock()
            .await
            .take()
            .ok_or(PersistenceError::NoActiveSession)?;
        tx.commit().await?;
        tracing::info!("PostgreSQL transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> PersistenceResult<()> {
        let tx = self
            .transaction
            .lock()
            .await
            .take()
            .ok_or(PersistenceError::NoActiveSession)?;
        tx.rollback().await?;
        tracing::warn!("PostgreSQL transaction rolled back");
        Ok(())
    }

    async fn persist_team(&self, team: &Team) -> PersistenceResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO team (team_id, name)
            VALUES ($1, $2)
            ON CONFLICT (team_id) DO UPDATE SET
                name = EXCLUDED.name
            "#,
        )
        .bind(team.id())
        .bind(team.name());

        self.execute_in_session(query).await?;
        tracing::debug!(team_id = %team.id(), name = team.name(), "Persisted team");
        Ok(())
    }

    async fn persist_member(&self, member: &Member) -> PersistenceResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO member (member_id, user_name, age, team_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (member_id) DO UPDATE SET
                user_name = EXCLUDED.user_name,
                age = EXCLUDED.age,
                team_id = EXCLUDED.team_id
            "#,
        )
        .bind(member.id())
        .bind(member.user_name())
        .bind(member.age())
        .bind(member.team_id());

        match self.execute_in_session(query).await {
            Err(PersistenceError::Database(sqlx::Error::Database(db)))
                if db.is_foreign_key_violation() =>
            {
                Err(PersistenceError::MissingReference {
                    table: Team::TABLE,
                    id: member
                        .team_id()
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                })
            }
            result => {
                result?;
                tracing::debug!(
                    member_id = %member.id(),
                    user_name = member.user_name(),
                    "Persisted member"
                );
                Ok(())
            }
        }
    }

    async fn find_team(&self, id: TeamId) -> PersistenceResult<Option<Team>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE team_id = $1",
            Team::SELECT_LIST,
            Team::TABLE
        );
        self.fetch_optional_as(sqlx::query_as::<_, Team>(&sql).bind(id))
            .await
    }

    async fn find_member(&self, id: MemberId) -> PersistenceResult<Option<Member>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE member_id = $1",
            Member::SELECT_LIST,
            Member::TABLE
        );
        self.fetch_optional_as(sqlx::query_as::<_, Member>(&sql).bind(id))
            .await
    }
}

#[async_trait]
impl<E: PgEntity> QueryExecutor<E> for PostgresContext {
    async fn fetch(&self, query: &Query<E>) -> PersistenceResult<Vec<E>> {
        let mut builder = select_sql(query);
        tracing::debug!(sql = builder.sql(), "Executing query");
        self.fetch_all_as(builder.build_query_as::<E>()).await
    }

    async fn count(&self, query: &Query<E>) -> PersistenceResult<u64> {
        let mut builder = count_sql(query);
        tracing::debug!(sql = builder.sql(), "Executing count");
        let count = self.fetch_scalar(builder.build_query_scalar::<i64>()).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
