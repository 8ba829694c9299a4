//! Request handlers

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::engine::NewsletterRun;
use crate::error::NewsletterError;
use crate::model::TickerRequest;
use crate::web::state::AppState;

/// Render a page with a status, falling back to a plain 500
fn render_page<S: Serialize>(state: &AppState, status: StatusCode, name: &str, ctx: S) -> Response {
    match state.pages.render(name, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(template = name, error = %e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// GET / - The research form
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    render_page(&state, StatusCode::OK, "index.html", context! {})
}

#[derive(Debug, Deserialize)]
pub struct ResearchForm {
    #[serde(default)]
    pub ticker: String,
}

#[derive(Serialize)]
struct SentimentRow {
    asset: String,
    summary: String,
    forecast: String,
    score: String,
}

fn sentiment_rows(run: &NewsletterRun) -> Vec<SentimentRow> {
    run.sentiment
        .blocks
        .iter()
        .map(|block| SentimentRow {
            asset: block.asset.clone(),
            summary: block.summary.clone(),
            forecast: block.forecast.map_or_else(|| "N/A".to_string(), |t| t.to_string()),
            score: block.score.map_or_else(|| "N/A".to_string(), |s| s.to_string()),
        })
        .collect()
}

fn failure_status(err: &NewsletterError) -> StatusCode {
    match err {
        NewsletterError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        NewsletterError::DataUnavailable { .. } => StatusCode::NOT_FOUND,
        NewsletterError::SearchUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /research - Run the pipeline for the submitted ticker
pub async fn research(State(state): State<Arc<AppState>>, Form(form): Form<ResearchForm>) -> Response {
    let ticker = match TickerRequest::parse(&form.ticker) {
        Ok(ticker) => ticker,
        Err(err) => {
            return render_page(
                &state,
                StatusCode::UNPROCESSABLE_ENTITY,
                "index.html",
                context! { ticker => form.ticker.trim(), error => err.to_string() },
            );
        }
    };

    let _running = state.run_lock().lock().await;
    info!(ticker = %ticker, "Research requested");

    let outcome = match state.pipeline() {
        Ok(pipeline) => pipeline.research(ticker.as_str()).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(run) => render_page(
            &state,
            StatusCode::OK,
            "result.html",
            context! {
                ticker => &run.ticker,
                run_id => run.run_id.to_string(),
                trend => run.trend.headline(),
                markdown => run.markdown(),
                sentiment => sentiment_rows(&run),
                degradations => run.degradations.iter().map(ToString::to_string).collect::<Vec<_>>(),
                supervisor_iterations => run.supervisor_iterations,
            },
        ),
        Err(err) => {
            error!(ticker = %ticker, category = err.category(), error = %err, "Research failed");
            render_page(
                &state,
                failure_status(&err),
                "failure.html",
                context! { ticker => ticker.as_str(), message => err.user_message() },
            )
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockMarketDataSource, MockNewsSearch};
    use crate::config::NewsletterConfig;
    use crate::engine::NewsletterPipeline;
    use crate::model::PriceSeries;
    use crate::web::state::PipelineFactory;
    use agent_llm::testing::ScriptedProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> Arc<NewsletterConfig> {
        Arc::new(NewsletterConfig::builder().api_key("sk-test").build().unwrap())
    }

    /// Pipelines whose market data is always empty, counting how many were built
    fn empty_market_factory(built: Arc<AtomicUsize>) -> PipelineFactory {
        Arc::new(move |config: Arc<NewsletterConfig>| {
            built.fetch_add(1, Ordering::SeqCst);
            let mut market = MockMarketDataSource::new();
            market
                .expect_fetch()
                .returning(|ticker, _| Ok(PriceSeries::new(ticker, Vec::new())));
            NewsletterPipeline::builder(config)
                .provider(Arc::new(ScriptedProvider::default()))
                .market_data(Arc::new(market))
                .news_search(Arc::new(MockNewsSearch::new()))
                .build()
        })
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_page() {
        let built = Arc::new(AtomicUsize::new(0));
        let state = AppState::with_factory(config(), empty_market_factory(built)).unwrap();

        let response = index(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.contains("Select the ticker"));
    }

    #[tokio::test]
    async fn test_blank_ticker_is_rejected_without_running() {
        let built = Arc::new(AtomicUsize::new(0));
        let state = AppState::with_factory(config(), empty_market_factory(built.clone())).unwrap();

        let form = ResearchForm {
            ticker: "   ".to_string(),
        };
        let response = research(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(response).await.contains("Please fill the ticker field"));
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_ticker_shows_data_message() {
        let built = Arc::new(AtomicUsize::new(0));
        let state = AppState::with_factory(config(), empty_market_factory(built.clone())).unwrap();

        let form = ResearchForm {
            ticker: "zzzz".to_string(),
        };
        let response = research(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = body(response).await;
        assert!(html.contains("No market data is available for ZZZZ"));
        assert!(!html.contains("Results of research:"));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health().await;
        assert_eq!(health.status, "ok");
    }
}
