use crate::Db;
use chrono::Utc;
use domain::CommentStatus;
use sqlx::{Sqlite, Transaction};

/// Pending moderation writes inside one transaction.
///
/// Nothing is visible to other connections until [`ModerationSession::flush`];
/// dropping the session rolls everything back.
pub struct ModerationSession {
    tx: Transaction<'static, Sqlite>,
}

impl Db {
    pub async fn begin_moderation(&self) -> anyhow::Result<ModerationSession> {
        let tx = self.pool.begin().await?;
        Ok(ModerationSession { tx })
    }
}

impl ModerationSession {
    /// Returns `false` when no such comment exists.
    pub async fn remove_comment(&mut self, id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn save_status(&mut self, id: &str, status: CommentStatus) -> anyhow::Result<bool> {
        let now = Utc::now().naive_utc();
        let res = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn flush(self) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
