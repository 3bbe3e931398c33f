use sqlx::SqliteConnection;

use crate::db_types::{Client, ClientSegment, Clp, NewClient};

pub async fn insert_client(client: NewClient, conn: &mut SqliteConnection) -> Result<Client, sqlx::Error> {
    let client = sqlx::query_as("INSERT INTO clients (name, email, phone) VALUES ($1, $2, $3) RETURNING *")
        .bind(client.name)
        .bind(client.email)
        .bind(client.phone)
        .fetch_one(conn)
        .await?;
    Ok(client)
}

pub async fn fetch_client(client_id: i64, conn: &mut SqliteConnection) -> Result<Option<Client>, sqlx::Error> {
    let client = sqlx::query_as("SELECT * FROM clients WHERE id = $1").bind(client_id).fetch_optional(conn).await?;
    Ok(client)
}

/// Overwrites the client's derived figures. Returns `None` if the client does not exist.
pub async fn update_aggregates(
    client_id: i64,
    total_spent: Clp,
    order_count: i64,
    segment: ClientSegment,
    conn: &mut SqliteConnection,
) -> Result<Option<Client>, sqlx::Error> {
    let client = sqlx::query_as(
        r#"
            UPDATE clients SET
                total_spent = $1,
                order_count = $2,
                segment = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(total_spent.value())
    .bind(order_count)
    .bind(segment)
    .bind(client_id)
    .fetch_optional(conn)
    .await?;
    Ok(client)
}

/// Sets the client's segment without touching the derived figures.
pub async fn set_segment(
    client_id: i64,
    segment: ClientSegment,
    conn: &mut SqliteConnection,
) -> Result<Option<Client>, sqlx::Error> {
    let client =
        sqlx::query_as("UPDATE clients SET segment = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(segment)
            .bind(client_id)
            .fetch_optional(conn)
            .await?;
    Ok(client)
}
