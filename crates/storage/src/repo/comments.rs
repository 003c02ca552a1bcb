use crate::{
    models::{into_comments, SqlComment},
    Db,
};
use domain::{Comment, CommentFilter, SiteId, SpamFilter};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

const COMMENT_COLUMNS: &str = r#"
    SELECT id, site_id, post_slug, author_name, author_email,
           content, status, created_at, updated_at
    FROM comments
"#;

/// Outcome of deleting every comment matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkRemoval {
    pub removed: u64,
    /// Distinct (site, post) pairs that lost comments.
    pub posts: Vec<(SiteId, String)>,
}

/// Substring pattern for `LIKE ... ESCAPE '\'`; `%` and `_` in the text match literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &CommentFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(text) = filter.search_text() {
        let pattern = like_pattern(text);
        qb.push(" AND (content LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR author_name LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
    if let Some(start) = filter.start_date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        qb.push(" AND created_at >= ").push_bind(start);
    }
    // end date is inclusive
    if let Some(end) = filter
        .end_date
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        qb.push(" AND created_at < ").push_bind(end);
    }
    if let Some(status) = filter.status.status() {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    match filter.spam {
        SpamFilter::All => {}
        SpamFilter::NoSpam => {
            qb.push(" AND status <> 'SPAM'");
        }
        SpamFilter::OnlySpam => {
            qb.push(" AND status = 'SPAM'");
        }
    }
}

impl Db {
    pub async fn insert_comment(&self, c: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, site_id, post_slug, author_name, author_email,
                content, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&c.id)
        .bind(c.site_id.as_str())
        .bind(&c.post_slug)
        .bind(&c.author_name)
        .bind(&c.author_email)
        .bind(&c.content)
        .bind(c.status.as_str())
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let sql = format!("{} WHERE id = ?", COMMENT_COLUMNS);
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::try_from).transpose()?)
    }

    pub async fn get_comments_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Comment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_COLUMNS);
        qb.push(" WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows = qb
            .build_query_as::<SqlComment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(into_comments(rows)?)
    }

    /// Filtered query; a `None` limit returns every match.
    pub async fn query_comments(
        &self,
        filter: &CommentFilter,
        reverse_chrono: bool,
        offset: i64,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Comment>> {
        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_COLUMNS);
        push_filter(&mut qb, filter);

        if reverse_chrono {
            qb.push(" ORDER BY created_at DESC, id DESC");
        } else {
            qb.push(" ORDER BY created_at ASC, id ASC");
        }
        qb.push(" LIMIT ")
            .push_bind(limit.unwrap_or(-1))
            .push(" OFFSET ")
            .push_bind(offset.max(0));

        let rows = qb
            .build_query_as::<SqlComment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(into_comments(rows)?)
    }

    pub async fn count_matching_comments(&self, filter: &CommentFilter) -> anyhow::Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments");
        push_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn remove_matching_comments(
        &self,
        filter: &CommentFilter,
    ) -> anyhow::Result<BulkRemoval> {
        let mut tx = self.pool.begin().await?;

        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT DISTINCT site_id, post_slug FROM comments");
        push_filter(&mut qb, filter);
        let posts: Vec<(String, String)> = qb.build_query_as().fetch_all(&mut *tx).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM comments");
        push_filter(&mut qb, filter);
        let removed = qb.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;
        debug!("Removed {} comments across {} posts", removed, posts.len());

        Ok(BulkRemoval {
            removed,
            posts: posts
                .into_iter()
                .map(|(site_id, slug)| (SiteId::new_unchecked(site_id), slug))
                .collect(),
        })
    }

    /// Approved comments of one post, oldest first.
    pub async fn list_post_comments(
        &self,
        site_id: &str,
        slug: &str,
    ) -> anyhow::Result<Vec<Comment>> {
        let sql = format!(
            "{} WHERE site_id = ? AND post_slug = ? AND status = 'APPROVED' \
             ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(site_id)
            .bind(slug)
            .fetch_all(&self.pool)
            .await?;

        Ok(into_comments(rows)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use domain::{CommentStatus, StatusFilter};

    pub(crate) fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    pub(crate) fn comment(id: &str, status: CommentStatus, created_at: NaiveDateTime) -> Comment {
        Comment {
            id: id.to_string(),
            site_id: SiteId::new("blog.example").unwrap(),
            post_slug: "hello".to_string(),
            author_name: format!("author-{}", id),
            author_email: None,
            content: format!("content of {}", id),
            status,
            created_at,
            updated_at: None,
        }
    }

    pub(crate) async fn seeded_db() -> Db {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let rows = [
            comment("c1", CommentStatus::Approved, at(1, 9)),
            comment("c2", CommentStatus::Pending, at(2, 9)),
            comment("c3", CommentStatus::Spam, at(3, 9)),
            comment("c4", CommentStatus::Disapproved, at(4, 9)),
            comment("c5", CommentStatus::Approved, at(5, 9)),
        ];
        for c in &rows {
            db.insert_comment(c).await.unwrap();
        }
        db
    }

    fn ids_of(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn query_is_reverse_chronological_with_limit_and_offset() {
        let db = seeded_db().await;
        let filter = CommentFilter::default();

        let page = db.query_comments(&filter, true, 1, Some(2)).await.unwrap();
        assert_eq!(ids_of(&page), vec!["c4", "c3"]);

        let all = db.query_comments(&filter, false, 0, None).await.unwrap();
        assert_eq!(ids_of(&all), vec!["c1", "c2", "c3", "c4", "c5"]);
    }

    #[tokio::test]
    async fn query_applies_status_spam_and_date_filters() {
        let db = seeded_db().await;

        let approved = CommentFilter {
            status: StatusFilter::OnlyApproved,
            ..Default::default()
        };
        let rows = db.query_comments(&approved, true, 0, None).await.unwrap();
        assert_eq!(ids_of(&rows), vec!["c5", "c1"]);

        let only_spam = CommentFilter {
            spam: SpamFilter::OnlySpam,
            ..Default::default()
        };
        assert_eq!(db.count_matching_comments(&only_spam).await.unwrap(), 1);

        let no_spam = CommentFilter {
            spam: SpamFilter::NoSpam,
            ..Default::default()
        };
        assert_eq!(db.count_matching_comments(&no_spam).await.unwrap(), 4);

        let range = CommentFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 4),
            ..Default::default()
        };
        let rows = db.query_comments(&range, false, 0, None).await.unwrap();
        assert_eq!(ids_of(&rows), vec!["c2", "c3", "c4"]);
    }

    #[tokio::test]
    async fn query_searches_content_and_author() {
        let db = seeded_db().await;
        let filter = CommentFilter {
            search: Some("author-c2".into()),
            ..Default::default()
        };
        let rows = db.query_comments(&filter, true, 0, None).await.unwrap();
        assert_eq!(ids_of(&rows), vec!["c2"]);

        let filter = CommentFilter {
            search: Some("content of c4".into()),
            ..Default::default()
        };
        assert_eq!(db.count_matching_comments(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let db = seeded_db().await;
        let mut discount = comment("d1", CommentStatus::Approved, at(6, 9));
        discount.content = "50% off today".to_string();
        let mut bulk = comment("d2", CommentStatus::Approved, at(7, 9));
        bulk.content = "500 items in stock".to_string();
        let mut snake = comment("d3", CommentStatus::Approved, at(8, 9));
        snake.author_name = "snake_case".to_string();
        for c in [&discount, &bulk, &snake] {
            db.insert_comment(c).await.unwrap();
        }

        let percent = CommentFilter {
            search: Some("50%".into()),
            ..Default::default()
        };
        let rows = db.query_comments(&percent, true, 0, None).await.unwrap();
        assert_eq!(ids_of(&rows), vec!["d1"]);

        // `_` would otherwise match the `-` in every "author-cN"
        let underscore = CommentFilter {
            search: Some("r_c".into()),
            ..Default::default()
        };
        assert_eq!(db.count_matching_comments(&underscore).await.unwrap(), 0);

        let literal = CommentFilter {
            search: Some("e_c".into()),
            ..Default::default()
        };
        let rows = db.query_comments(&literal, true, 0, None).await.unwrap();
        assert_eq!(ids_of(&rows), vec!["d3"]);

        let removal = db.remove_matching_comments(&percent).await.unwrap();
        assert_eq!(removal.removed, 1);
        assert!(db.get_comment("d2").await.unwrap().is_some());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("plain"), "%plain%");
        assert_eq!(like_pattern(r"50%_\"), r"%50\%\_\\%");
    }

    #[tokio::test]
    async fn get_by_ids_and_missing_comment() {
        let db = seeded_db().await;

        let mut rows = db
            .get_comments_by_ids(&["c3".to_string(), "c1".to_string(), "nope".to_string()])
            .await
            .unwrap();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(ids_of(&rows), vec!["c1", "c3"]);
        assert_eq!(rows[1].status, CommentStatus::Spam);

        assert!(db.get_comment("nope").await.unwrap().is_none());
        assert!(db.get_comments_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_matching_deletes_only_matches() {
        let db = seeded_db().await;
        let mut other_post = comment("c6", CommentStatus::Spam, at(6, 9));
        other_post.post_slug = "second".to_string();
        db.insert_comment(&other_post).await.unwrap();

        let filter = CommentFilter {
            spam: SpamFilter::OnlySpam,
            ..Default::default()
        };
        let removal = db.remove_matching_comments(&filter).await.unwrap();

        assert_eq!(removal.removed, 2);
        let mut slugs: Vec<&str> = removal.posts.iter().map(|(_, s)| s.as_str()).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["hello", "second"]);

        let rest = db
            .query_comments(&CommentFilter::default(), false, 0, None)
            .await
            .unwrap();
        assert_eq!(ids_of(&rest), vec!["c1", "c2", "c4", "c5"]);
    }

    #[tokio::test]
    async fn post_listing_only_shows_approved() {
        let db = seeded_db().await;
        let rows = db.list_post_comments("blog.example", "hello").await.unwrap();
        assert_eq!(ids_of(&rows), vec!["c1", "c5"]);
    }
}
