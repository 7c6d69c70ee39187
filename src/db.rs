use std::fs;
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::batch::Summary;
use crate::record::TitleRecord;
use crate::sites::Site;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS titles (
            url             TEXT PRIMARY KEY,
            site            TEXT NOT NULL,
            title_name      TEXT,
            title_name_en   TEXT,
            cover_image_url TEXT,
            art_author      TEXT,
            story_author    TEXT,
            original_author TEXT,
            like_count      INTEGER,
            view_count      INTEGER,
            rating          REAL,
            age_rating      TEXT,
            status          TEXT,
            genre           TEXT,
            tagline         TEXT,
            tags            TEXT NOT NULL DEFAULT '[]',
            error           TEXT,
            run_id          TEXT NOT NULL,
            scraped_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_titles_site ON titles(site);

        CREATE TABLE IF NOT EXISTS runs (
            run_id      TEXT PRIMARY KEY,
            site        TEXT NOT NULL,
            total       INTEGER NOT NULL,
            errors      INTEGER NOT NULL,
            elapsed_ms  INTEGER NOT NULL,
            finished_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

pub fn new_run_id() -> String {
    format!("run-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"))
}

fn count_value(n: Option<u64>) -> Option<i64> {
    n.and_then(|v| i64::try_from(v).ok())
}

/// Upsert one row per url. A later run replaces the earlier row.
pub fn save_records(
    conn: &Connection,
    site: Site,
    run_id: &str,
    records: &[TitleRecord],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO titles
             (url, site, title_name, title_name_en, cover_image_url, art_author, story_author,
              original_author, like_count, view_count, rating, age_rating, status, genre,
              tagline, tags, error, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )?;
        for r in records {
            let tags = serde_json::to_string(&r.tags)?;
            count += stmt.execute(rusqlite::params![
                r.url,
                site.slug(),
                r.title_name,
                r.title_name_en,
                r.cover_image_url,
                r.art_author,
                r.story_author,
                r.original_author,
                count_value(r.like_count),
                count_value(r.view_count),
                r.rating,
                r.age_rating,
                r.status,
                r.genre,
                r.tagline,
                tags,
                r.error,
                run_id,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn save_run(conn: &Connection, run_id: &str, site: Site, summary: &Summary) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO runs (run_id, site, total, errors, elapsed_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            run_id,
            site.slug(),
            summary.total as i64,
            summary.errors as i64,
            summary.elapsed.as_millis() as i64,
        ],
    )?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub url: String,
    pub site: String,
    pub title_name: String,
    pub authors: String,
    pub like_count: Option<i64>,
    pub view_count: Option<i64>,
    pub status: String,
    pub tags: Vec<String>,
    pub error: Option<String>,
}

pub fn fetch_overview(conn: &Connection, site: Option<Site>, limit: usize) -> Result<Vec<OverviewRow>> {
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let where_clause = match site {
        Some(s) => {
            params.push(Box::new(s.slug()));
            " WHERE site = ?1"
        }
        None => "",
    };

    let sql = format!(
        "SELECT url, site, COALESCE(title_name,''),
                CASE
                    WHEN story_author IS NULL THEN COALESCE(art_author,'')
                    WHEN art_author IS NULL OR art_author = story_author THEN story_author
                    ELSE story_author || ' / ' || art_author
                END,
                like_count, view_count, COALESCE(status,''), tags, error
         FROM titles{}
         ORDER BY COALESCE(like_count, view_count, 0) DESC, title_name
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let tags: String = row.get(7)?;
            Ok(OverviewRow {
                url: row.get(0)?,
                site: row.get(1)?,
                title_name: row.get(2)?,
                authors: row.get(3)?,
                like_count: row.get(4)?,
                view_count: row.get(5)?,
                status: row.get(6)?,
                tags: serde_json::from_str(&tags).unwrap_or_default(),
                error: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

/// Column name and record field label, in record order.
const FIELD_COLUMNS: &[(&str, &str)] = &[
    ("title_name", "titleName"),
    ("title_name_en", "titleNameEn"),
    ("cover_image_url", "coverImageUrl"),
    ("art_author", "artAuthor"),
    ("story_author", "storyAuthor"),
    ("original_author", "originalAuthor"),
    ("like_count", "likeCount"),
    ("view_count", "viewCount"),
    ("rating", "rating"),
    ("age_rating", "ageRating"),
    ("status", "status"),
    ("genre", "genre"),
    ("tagline", "tagline"),
];

pub struct Stats {
    pub total: usize,
    pub errors: usize,
    pub runs: usize,
    pub fields: Vec<(&'static str, usize)>,
    pub with_tags: usize,
}

pub fn get_stats(conn: &Connection, site: Option<Site>) -> Result<Stats> {
    let slug = site.map(|s| s.slug());
    let scoped = |cond: &str| -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM titles WHERE (?1 IS NULL OR site = ?1) AND {}",
            cond
        );
        Ok(conn.query_row(&sql, [slug], |r| r.get(0))?)
    };

    let total = scoped("1")?;
    let errors = scoped("error IS NOT NULL")?;
    let mut fields = Vec::with_capacity(FIELD_COLUMNS.len());
    for (column, label) in FIELD_COLUMNS {
        fields.push((*label, scoped(&format!("{} IS NOT NULL", column))?));
    }
    let with_tags = scoped("tags != '[]'")?;
    let runs: usize = conn.query_row(
        "SELECT COUNT(*) FROM runs WHERE (?1 IS NULL OR site = ?1)",
        [slug],
        |r| r.get(0),
    )?;

    Ok(Stats {
        total,
        errors,
        runs,
        fields,
        with_tags,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(id: u32, likes: Option<u64>) -> TitleRecord {
        let mut r = TitleRecord::new(format!("https://comic.naver.com/webtoon/list?titleId={id}"));
        r.title_name = Some(format!("작품{id}"));
        r.story_author = Some("JP".into());
        r.art_author = Some("이히".into());
        r.like_count = likes;
        r.tags.insert("#무협".into());
        r
    }

    #[test]
    fn upsert_replaces_by_url() {
        let conn = memory();
        save_records(&conn, Site::Naver, "run-1", &[record(1, Some(10))]).unwrap();
        save_records(&conn, Site::Naver, "run-2", &[record(1, Some(20))]).unwrap();

        let rows = fetch_overview(&conn, None, 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].like_count, Some(20));
        assert_eq!(rows[0].authors, "JP / 이히");
        assert_eq!(rows[0].tags, vec!["#무협".to_string()]);
    }

    #[test]
    fn overview_filters_by_site_and_sorts_by_popularity() {
        let conn = memory();
        save_records(&conn, Site::Naver, "r", &[record(1, Some(5)), record(2, Some(500))]).unwrap();
        let mut kakao = TitleRecord::new("https://page.kakao.com/content/53764524");
        kakao.view_count = Some(9000);
        save_records(&conn, Site::Kakao, "r", &[kakao]).unwrap();

        let naver = fetch_overview(&conn, Some(Site::Naver), 50).unwrap();
        let names: Vec<&str> = naver.iter().map(|r| r.title_name.as_str()).collect();
        assert_eq!(names, vec!["작품2", "작품1"]);

        let all = fetch_overview(&conn, None, 1).unwrap();
        assert_eq!(all[0].site, "kakao");
    }

    #[test]
    fn stats_count_fields_and_errors() {
        let conn = memory();
        let records = vec![
            record(1, Some(5)),
            record(2, None),
            TitleRecord::failed("https://comic.naver.com/webtoon/list?titleId=3", "HTTP 404"),
        ];
        save_records(&conn, Site::Naver, "run-1", &records).unwrap();
        let summary = Summary::from_records(&records, Duration::from_millis(1500));
        save_run(&conn, "run-1", Site::Naver, &summary).unwrap();

        let s = get_stats(&conn, Some(Site::Naver)).unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.errors, 1);
        assert_eq!(s.runs, 1);
        assert_eq!(s.with_tags, 2);
        assert!(s.fields.contains(&("titleName", 2)));
        assert!(s.fields.contains(&("likeCount", 1)));

        let other = get_stats(&conn, Some(Site::Toons)).unwrap();
        assert_eq!(other.total, 0);
    }
}
