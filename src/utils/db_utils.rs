use anyhow::bail;
use sqlx::MySql;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Null,
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::String)
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build UPDATE SQL
/// ===============================
/// `guard` adds an extra `AND column = ?` so the write only lands while the
/// row is still in the expected state.
pub fn build_update_sql(
    table: &str,
    assignments: Vec<(&str, SqlValue)>,
    id_column: &str,
    id_value: u64,
    guard: Option<(&str, SqlValue)>,
) -> anyhow::Result<SqlUpdate> {
    if assignments.is_empty() {
        bail!("No fields provided for update");
    }

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    let mut values = Vec::with_capacity(assignments.len() + 2);
    values.extend(assignments.into_iter().map(|(_, value)| value));
    values.push(SqlValue::U64(id_value));

    if let Some((column, value)) = guard {
        sql.push_str(&format!(" AND {} = ?", column));
        values.push(value);
    }

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'c, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'c, Database = MySql>,
{
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}
