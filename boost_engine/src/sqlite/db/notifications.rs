use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

/// Records a notification. Call this inside the transaction that makes the change being announced.
pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let notification: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (user_id, notification_type, title, message, order_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.notification_type.to_string())
    .bind(notification.title)
    .bind(notification.message)
    .bind(notification.order_id.map(|o| o.0))
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Notification #{} ({}) queued for {}", notification.id, notification.notification_type, notification.user_id);
    Ok(notification)
}

pub async fn fetch_notifications_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}
