use actix_web::{HttpResponse, http};

pub(crate) async fn get() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((http::header::CONTENT_TYPE, "text/plain"))
        .body("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().route("/health", web::get().to(get))).await;
        let response =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(response.status().is_success());
        assert_eq!(test::read_body(response).await, "OK");
    }
}
