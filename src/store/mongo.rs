// src/store/mongo.rs
use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};

use super::{ReviewFilter, ReviewRecord, ReviewStore};

/// Review collection in MongoDB. Text search needs a text index on
/// `courseNameShort`:
///
/// ```text
/// db.pybestande.createIndex({ courseNameShort: "text" })
/// ```
pub struct MongoStore {
    reviews: Collection<ReviewRecord>,
    raw: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .with_context(|| format!("connecting to mongodb at {}", redact_uri(uri)))?;
        let db = client.database(database);
        tracing::info!(database, collection, "mongodb review store ready");
        Ok(Self {
            reviews: db.collection(collection),
            raw: db.collection(collection),
        })
    }
}

/// Drops `user:password@` from a connection string so it can be logged.
fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => uri.to_string(),
    }
}

fn filter_doc(filter: &ReviewFilter) -> Document {
    let mut d = doc! { "courseNameShort": filter.course_name_short.as_str() };
    if let Some(uni) = &filter.university {
        d.insert("university", uni.as_str());
    }
    d
}

#[async_trait::async_trait]
impl ReviewStore for MongoStore {
    async fn count_exact(&self, filter: &ReviewFilter, cap: usize) -> Result<usize> {
        // limit(0) means "no limit" to the server
        if cap == 0 {
            return Ok(0);
        }
        let mut cursor = self
            .raw
            .find(filter_doc(filter))
            .projection(doc! { "_id": 1 })
            .limit(i64::try_from(cap).unwrap_or(i64::MAX))
            .await
            .context("mongodb exact probe")?;
        let mut n = 0usize;
        while cursor.try_next().await.context("mongodb exact probe cursor")?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    async fn text_search_names(&self, term: &str, limit: usize) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut cursor = self
            .raw
            .find(doc! { "$text": { "$search": term } })
            .projection(doc! { "courseNameShort": 1, "_id": 0 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .context("mongodb text search")?;
        let mut names = Vec::new();
        while let Some(d) = cursor.try_next().await.context("mongodb text search cursor")? {
            if let Ok(name) = d.get_str("courseNameShort") {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>> {
        let cursor = self
            .reviews
            .find(filter_doc(filter))
            .projection(doc! {
                "courseNameShort": 1,
                "university": 1,
                "review": 1,
                "score": 1,
                "upvotes": 1,
                "downvotes": 1,
            })
            .await
            .context("mongodb review query")?;
        cursor
            .try_collect()
            .await
            .context("mongodb review query cursor")
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_doc_adds_university_only_when_given() {
        let d = filter_doc(&ReviewFilter::new("CS101", None));
        assert_eq!(d, doc! { "courseNameShort": "CS101" });

        let d = filter_doc(&ReviewFilter::new("CS101", Some("ETH".into())));
        assert_eq!(d, doc! { "courseNameShort": "CS101", "university": "ETH" });
    }

    #[test]
    fn redact_uri_hides_credentials() {
        assert_eq!(
            redact_uri("mongodb://bot:s3cr@t@db.example:27017/test?authSource=admin"),
            "mongodb://***@db.example:27017/test?authSource=admin"
        );
        assert_eq!(
            redact_uri("mongodb+srv://bot:pw@cluster0.example.net"),
            "mongodb+srv://***@cluster0.example.net"
        );
        assert_eq!(redact_uri("mongodb://localhost:27017/"), "mongodb://localhost:27017/");
        assert_eq!(redact_uri("not a uri"), "not a uri");
    }
}
