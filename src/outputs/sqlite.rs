//! SQLite persistence for extracted articles.
//!
//! Articles are keyed by URL. Authors, sources and tags are name-keyed
//! dimension tables linked to articles through junction tables. Every write
//! is an insert-or-ignore, so persisting the same article any number of times
//! leaves the store unchanged after the first.
//!
//! # Schema
//!
//! ```text
//! articles ──< articles_authors >── authors
//!          ──< articles_sources >── sources
//!          ──< articles_tags    >── tags
//! ```

use crate::models::Article;
use itertools::Itertools;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::{debug, info, instrument};

pub const CREATE_ARTICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id_article INTEGER PRIMARY KEY AUTOINCREMENT,
    article_title TEXT NOT NULL,
    article_subtitle TEXT NULL,
    article_date DATE NOT NULL,
    article_url TEXT NOT NULL,
    article_type TEXT NOT NULL,
    article_content TEXT NOT NULL,
    article_content_no_tags TEXT NOT NULL,
    article_content_no_punc TEXT NOT NULL,
    article_word_count INTEGER NOT NULL,
    article_translated BOOL NOT NULL,
    UNIQUE (article_url)
)
"#;

pub const CREATE_AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id_author INTEGER PRIMARY KEY AUTOINCREMENT,
    author_name TEXT NOT NULL,
    UNIQUE (author_name)
)
"#;

pub const CREATE_SOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id_source INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL,
    UNIQUE (source_name)
)
"#;

pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id_tag INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name TEXT NOT NULL,
    UNIQUE (tag_name)
)
"#;

pub const CREATE_ARTICLES_AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles_authors (
    fk_article INTEGER NOT NULL,
    fk_author INTEGER NOT NULL,
    PRIMARY KEY (fk_article, fk_author),
    FOREIGN KEY (fk_article) REFERENCES articles (id_article),
    FOREIGN KEY (fk_author) REFERENCES authors (id_author)
)
"#;

pub const CREATE_ARTICLES_SOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles_sources (
    fk_article INTEGER NOT NULL,
    fk_source INTEGER NOT NULL,
    PRIMARY KEY (fk_article, fk_source),
    FOREIGN KEY (fk_article) REFERENCES articles (id_article),
    FOREIGN KEY (fk_source) REFERENCES sources (id_source)
)
"#;

pub const CREATE_ARTICLES_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles_tags (
    fk_article INTEGER NOT NULL,
    fk_tag INTEGER NOT NULL,
    PRIMARY KEY (fk_article, fk_tag),
    FOREIGN KEY (fk_article) REFERENCES articles (id_article),
    FOREIGN KEY (fk_tag) REFERENCES tags (id_tag)
)
"#;

const SCHEMA: &[&str] = &[
    CREATE_ARTICLES_TABLE,
    CREATE_AUTHORS_TABLE,
    CREATE_SOURCES_TABLE,
    CREATE_TAGS_TABLE,
    CREATE_ARTICLES_AUTHORS_TABLE,
    CREATE_ARTICLES_SOURCES_TABLE,
    CREATE_ARTICLES_TAGS_TABLE,
];

const INSERT_ARTICLE: &str = r#"
INSERT OR IGNORE INTO articles
    (article_title, article_subtitle, article_date, article_url, article_type,
     article_content, article_content_no_tags, article_content_no_punc,
     article_word_count, article_translated)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

/// A name-keyed dimension and the junction table linking it to articles.
struct Dimension {
    table: &'static str,
    id_column: &'static str,
    name_column: &'static str,
    junction: &'static str,
    fk_column: &'static str,
}

const AUTHORS: Dimension = Dimension {
    table: "authors",
    id_column: "id_author",
    name_column: "author_name",
    junction: "articles_authors",
    fk_column: "fk_author",
};

const SOURCES: Dimension = Dimension {
    table: "sources",
    id_column: "id_source",
    name_column: "source_name",
    junction: "articles_sources",
    fk_column: "fk_source",
};

const TAGS: Dimension = Dimension {
    table: "tags",
    id_column: "id_tag",
    name_column: "tag_name",
    junction: "articles_tags",
    fk_column: "fk_tag",
};

/// Result of [`Store::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persisted {
    pub article_id: i64,
    /// `false` when an article with the same URL was already stored.
    pub inserted: bool,
}

/// The article database, opened once per run.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let store = Self::init(Connection::open(path.as_ref())?)?;
        info!("Opened article store");
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        for statement in SCHEMA {
            conn.execute(statement, ())?;
        }
        Ok(Self { conn })
    }

    /// Store `article` and its authors, sources and tags in one transaction.
    ///
    /// Re-persisting an article, or one sharing names with earlier articles,
    /// creates no duplicate rows.
    pub fn persist(&mut self, article: &Article) -> rusqlite::Result<Persisted> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            INSERT_ARTICLE,
            (
                &article.title,
                &article.subtitle,
                article.date,
                &article.url,
                article.article_type.as_str(),
                &article.content,
                &article.content_no_tags,
                &article.content_no_punc,
                article.word_count as i64,
                article.translated,
            ),
        )? == 1;

        let article_id: i64 = tx.query_row(
            "SELECT id_article FROM articles WHERE article_url = ?1",
            (&article.url,),
            |row| row.get(0),
        )?;

        let authors = link_dimension(&tx, &AUTHORS, article_id, &article.authors)?;
        let sources = link_dimension(&tx, &SOURCES, article_id, &article.sources)?;
        let tags = link_dimension(&tx, &TAGS, article_id, &article.tags)?;
        tx.commit()?;

        debug!(
            article_id,
            inserted,
            authors,
            sources,
            tags,
            url = %article.url,
            "Persisted article"
        );
        Ok(Persisted {
            article_id,
            inserted,
        })
    }
}

/// Insert-or-ignore each distinct name and its junction row.
///
/// Returns the number of junction rows created.
fn link_dimension(
    tx: &Transaction<'_>,
    dimension: &Dimension,
    article_id: i64,
    names: &[String],
) -> rusqlite::Result<usize> {
    if names.is_empty() {
        return Ok(0);
    }

    let mut insert_name = tx.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES (?1)",
        dimension.table, dimension.name_column
    ))?;
    let mut find_id = tx.prepare_cached(&format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        dimension.id_column, dimension.table, dimension.name_column
    ))?;
    let mut link = tx.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {} (fk_article, {}) VALUES (?1, ?2)",
        dimension.junction, dimension.fk_column
    ))?;

    let mut linked = 0;
    for name in names.iter().unique() {
        insert_name.execute((name,))?;
        let id: i64 = find_id.query_row((name,), |row| row.get(0))?;
        linked += link.execute((article_id, id))?;
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleBuilder, ArticleType};
    use chrono::NaiveDate;

    fn article(url: &str, article_type: ArticleType, names: &[&str], tags: &[&str]) -> Article {
        ArticleBuilder::new("test")
            .title("Title")
            .date(NaiveDate::from_ymd_opt(2013, 8, 5).unwrap())
            .url(url)
            .article_type(article_type)
            .names(names.iter().map(|s| s.to_string()).collect())
            .tags(tags.iter().map(|s| s.to_string()).collect())
            .content_blocks(vec!["<p>Body text.</p>".to_string()])
            .build()
            .unwrap()
    }

    fn count(store: &Store, table: &str) -> i64 {
        store
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), (), |row| row.get(0))
            .unwrap()
    }

    const TABLES: [&str; 7] = [
        "articles",
        "authors",
        "sources",
        "tags",
        "articles_authors",
        "articles_sources",
        "articles_tags",
    ];

    fn counts(store: &Store) -> Vec<i64> {
        TABLES.iter().map(|table| count(store, table)).collect()
    }

    #[test]
    fn test_persist_article() {
        let mut store = Store::open_in_memory().unwrap();
        let a = article(
            "http://english.ahram.org.eg/News/1.aspx",
            ArticleType::News,
            &["Reuters", "Ahram Online"],
            &["egypt", "army"],
        );
        let persisted = store.persist(&a).unwrap();

        assert!(persisted.inserted);
        assert_eq!(counts(&store), vec![1, 0, 2, 2, 0, 2, 2]);

        let (title, date, kind, words): (String, String, String, i64) = store
            .conn
            .query_row(
                "SELECT article_title, article_date, article_type, article_word_count FROM articles",
                (),
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(title, "Title");
        assert_eq!(date, "2013-08-05");
        assert_eq!(kind, "News");
        assert_eq!(words, 2);
    }

    #[test]
    fn test_persist_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let a = article("http://x/1", ArticleType::Opinion, &["Jane Doe"], &["egypt"]);

        let first = store.persist(&a).unwrap();
        let before = counts(&store);
        let second = store.persist(&a).unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(first.article_id, second.article_id);
        assert_eq!(counts(&store), before);
    }

    #[test]
    fn test_shared_author_has_one_row_two_links() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .persist(&article("http://x/1", ArticleType::Opinion, &["Jane Doe"], &[]))
            .unwrap();
        store
            .persist(&article("http://x/2", ArticleType::Opinion, &["Jane Doe"], &[]))
            .unwrap();

        assert_eq!(count(&store, "authors"), 1);
        assert_eq!(count(&store, "articles_authors"), 2);
    }

    #[test]
    fn test_author_names_are_case_sensitive() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .persist(&article("http://x/1", ArticleType::Opinion, &["AFP"], &[]))
            .unwrap();
        store
            .persist(&article("http://x/2", ArticleType::Opinion, &["Afp"], &[]))
            .unwrap();
        assert_eq!(count(&store, "authors"), 2);
    }

    #[test]
    fn test_duplicate_names_link_once() {
        let mut store = Store::open_in_memory().unwrap();
        let mut a = article("http://x/1", ArticleType::News, &["Reuters"], &["egypt"]);
        a.tags.push("egypt".to_string());
        a.sources.push("Reuters".to_string());
        store.persist(&a).unwrap();

        assert_eq!(count(&store, "tags"), 1);
        assert_eq!(count(&store, "articles_tags"), 1);
        assert_eq!(count(&store, "articles_sources"), 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = Store::open_in_memory().unwrap();
        let enabled: i64 = store
            .conn
            .query_row("PRAGMA foreign_keys", (), |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
        assert!(
            store
                .conn
                .execute("INSERT INTO articles_tags (fk_article, fk_tag) VALUES (99, 99)", ())
                .is_err()
        );
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.db");
        {
            let mut store = Store::open(&path).unwrap();
            store
                .persist(&article("http://x/1", ArticleType::News, &["AP"], &["cairo"]))
                .unwrap();
        }
        let mut store = Store::open(&path).unwrap();
        assert_eq!(count(&store, "articles"), 1);
        let again = store
            .persist(&article("http://x/1", ArticleType::News, &["AP"], &["cairo"]))
            .unwrap();
        assert!(!again.inserted);
        assert_eq!(count(&store, "sources"), 1);
    }
}
