use std::sync::Mutex;

use actix_web::{HttpResponse, http, web};
use oaiserve_feed::Feed;
use oaiserve_store_db::StoreDb;

use crate::ServerResult;
use crate::error::{Result, ServerError};

/// Shared by all workers; SQLite access is serialized through the mutex.
pub(crate) struct OaiState {
    db: Mutex<StoreDb>,
    feed: Feed,
}

impl OaiState {
    pub(crate) fn new(db: StoreDb, feed: Feed) -> Self {
        Self {
            db: Mutex::new(db),
            feed,
        }
    }

    fn handle(&self, params: &[(String, String)]) -> Result<String> {
        let db = self.db.lock().map_err(|_| ServerError::Handler {
            reason: "store lock poisoned".to_string(),
        })?;
        Ok(self.feed.handle_request(&db, params)?)
    }
}

async fn respond(state: web::Data<OaiState>, params: Vec<(String, String)>) -> ServerResult {
    let body = web::block(move || state.handle(&params))
        .await
        .map_err(|e| {
            crate::error::RepositoryError::from(ServerError::Handler {
                reason: e.to_string(),
            })
        })??;

    Ok(HttpResponse::Ok()
        .insert_header((http::header::CONTENT_TYPE, "text/xml; charset=utf-8"))
        .body(body))
}

pub(crate) async fn get(
    state: web::Data<OaiState>,
    query: web::Query<Vec<(String, String)>>,
) -> ServerResult {
    respond(state, query.into_inner()).await
}

pub(crate) async fn post(
    state: web::Data<OaiState>,
    form: web::Form<Vec<(String, String)>>,
) -> ServerResult {
    respond(state, form.into_inner()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use chrono::{TimeZone, Utc};
    use oaiserve_feed::{FeedConfig, FormatRegistry};
    use oaiserve_store_db::{Metadata, RecordSets, SetDescriptor};
    use serde_json::json;

    fn state() -> web::Data<OaiState> {
        let mut db = StoreDb::open_memory().unwrap();
        let sets = RecordSets::from([("articles".to_string(), SetDescriptor::new("Articles"))]);
        let metadata = Metadata::from([("title".to_string(), vec![json!("Spam & Eggs")])]);
        db.update_record(
            "a1",
            Utc.with_ymd_and_hms(2010, 5, 1, 12, 0, 0).unwrap(),
            false,
            &sets,
            &metadata,
        )
        .unwrap();
        db.flush().unwrap();

        let config = FeedConfig {
            repository_name: "Test Repository".into(),
            ..FeedConfig::default()
        };
        let feed = Feed::new(config, FormatRegistry::with_defaults()).unwrap();
        web::Data::new(OaiState::new(db, feed))
    }

    async fn body_of(request: test::TestRequest) -> (http::StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .route("/oai", web::get().to(get))
                .route("/oai", web::post().to(post)),
        )
        .await;
        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = test::read_body(response).await;
        if status.is_success() {
            assert_eq!(content_type.as_deref(), Some("text/xml; charset=utf-8"));
        }
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn test_get_identify() {
        let (status, body) =
            body_of(test::TestRequest::get().uri("/oai?verb=Identify")).await;
        assert!(status.is_success());
        assert!(body.contains("<repositoryName>Test Repository</repositoryName>"));
    }

    #[actix_web::test]
    async fn test_get_record() {
        let (status, body) = body_of(
            test::TestRequest::get().uri("/oai?verb=GetRecord&identifier=oai%3Aa1&metadataPrefix=oai_dc"),
        )
        .await;
        assert!(status.is_success());
        assert!(body.contains("<identifier>oai:a1</identifier>"));
        assert!(body.contains("<dc:title>Spam &#38; Eggs</dc:title>"));
        assert!(body.contains("<setSpec>articles</setSpec>"));
    }

    #[actix_web::test]
    async fn test_post_form() {
        let (status, body) = body_of(
            test::TestRequest::post()
                .uri("/oai")
                .set_form([("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
        )
        .await;
        assert!(status.is_success());
        assert_eq!(body.matches("<identifier>").count(), 1);
    }

    /// Protocol errors are still HTTP 200 with an OAI-PMH error document.
    #[actix_web::test]
    async fn test_protocol_error() {
        let (status, body) = body_of(test::TestRequest::get().uri("/oai")).await;
        assert!(status.is_success());
        assert!(body.contains("<error code=\"badVerb\">"));

        let (_, body) =
            body_of(test::TestRequest::get().uri("/oai?verb=ListSets&resumptionToken=x")).await;
        assert!(body.contains("<error code=\"badResumptionToken\">"));
    }
}
