// Router for the static asset server

use anyhow::Result;
use axum::{Router, middleware};
use std::{path::Path, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AcceptEncoding, ServerSettings};

mod static_pages;

pub use static_pages::{ResponseHeaders, UrlRewrites};

pub fn create_router(settings: &ServerSettings) -> Result<Router> {
    let static_dir = Path::new(&settings.static_dir);
    let index_file = static_dir.join(&settings.index_file);

    // Paths with no file behind them get the index page so client-side routing takes over
    let assets = ServeDir::new(static_dir).fallback(ServeFile::new(index_file));

    let rewrites = UrlRewrites::compile(&settings.url_rewrite)?;
    let headers = ResponseHeaders::parse(&settings.headers)?;

    // Later layers wrap earlier ones: headers are added to preflight answers too
    let mut router = Router::new()
        .fallback_service(assets)
        .layer(middleware::map_request_with_state(rewrites, static_pages::rewrite_url))
        .layer(middleware::map_request(static_pages::answer_preflight))
        .layer(middleware::map_response_with_state(
            headers,
            static_pages::add_response_headers,
        ));

    router = match settings.accept_encoding {
        AcceptEncoding::Gzip => router.layer(CompressionLayer::new().gzip(true).deflate(false)),
        AcceptEncoding::Deflate => router.layer(CompressionLayer::new().gzip(false).deflate(true)),
        AcceptEncoding::None => router,
    };

    if settings.timeout_secs > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(settings.timeout_secs)));
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}
