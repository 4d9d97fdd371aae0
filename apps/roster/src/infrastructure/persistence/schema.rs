//! Table definitions for the PostgreSQL context

/// DDL applied by `PostgresContext::migrate`, in order
pub const STATEMENTS: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS team (
        team_id UUID PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS member (
        member_id UUID PRIMARY KEY,
        user_name TEXT NOT NULL,
        age INTEGER NOT NULL,
        team_id UUID NULL REFERENCES team (team_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS member_team_id_idx ON member (team_id)
    "#,
];
