use chrono::NaiveDateTime;
use domain::{Comment, SiteId, StatusParseError};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub site_id: String,
    pub post_slug: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub content: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl TryFrom<SqlComment> for Comment {
    type Error = StatusParseError;

    fn try_from(sql: SqlComment) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: sql.id,
            site_id: SiteId::new_unchecked(sql.site_id),
            post_slug: sql.post_slug,
            author_name: sql.author_name,
            author_email: sql.author_email,
            content: sql.content,
            status: sql.status.parse()?,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        })
    }
}

pub fn into_comments(rows: Vec<SqlComment>) -> Result<Vec<Comment>, StatusParseError> {
    rows.into_iter().map(Comment::try_from).collect()
}
