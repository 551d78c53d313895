use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};
use tracing::info;

use asearch_core::app::{AsyncSearchConfig, AsyncSearchService, error_body};
use asearch_core::domain::{
    AsyncSearchResponse, DeleteAsyncSearchRequest, GetAsyncSearchRequest, NodeId, SearchFailure,
    SubmitAsyncSearchRequest, TimeValue,
};
use asearch_core::ports::SearchExecutor;

/// Submit one search, poll it until it finishes, then delete it.
#[derive(Debug, Parser)]
#[command(name = "asearch", version)]
struct Args {
    /// JSON config file (node_id, keep-alive defaults and limits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides node_id from the config
    #[arg(long)]
    node_id: Option<String>,

    /// How long the sample search takes
    #[arg(long, default_value_t = 2500)]
    search_delay_ms: u64,

    /// wait_for_completion_timeout for submit and every poll
    #[arg(long, default_value = "1s")]
    wait: TimeValue,

    /// keep_alive sent with submit and every poll
    #[arg(long)]
    keep_alive: Option<TimeValue>,

    /// Make the sample search fail
    #[arg(long)]
    fail: bool,

    #[arg(long, default_value = "world")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GreetingQuery {
    name: String,
}

/// 一定時間かけて挨拶を返すだけの検索
struct GreetingExecutor {
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl SearchExecutor for GreetingExecutor {
    async fn execute(&self, query: Value) -> Result<Value, SearchFailure> {
        let q: GreetingQuery = serde_json::from_value(query)
            .map_err(|e| SearchFailure::new("parsing_exception", format!("json decode: {e}")))?;

        sleep(self.delay).await;
        if self.fail {
            return Err(SearchFailure::new(
                "search_phase_execution_exception",
                "intentional failure",
            ));
        }
        Ok(json!({ "greeting": format!("Hello, {}!", q.name) }))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("asearch=info")),
        )
        .init();
}

fn print(response: &AsyncSearchResponse) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    // (A) 設定: ファイル → CLI フラグの順に上書き
    let mut config = match &args.config {
        Some(path) => AsyncSearchConfig::from_json_file(path)?,
        None => AsyncSearchConfig::default(),
    };
    if let Some(node_id) = args.node_id {
        config.node_id = NodeId::new(node_id)?;
    }

    let executor = Arc::new(GreetingExecutor {
        delay: Duration::from_millis(args.search_delay_ms),
        fail: args.fail,
    });
    let service = AsyncSearchService::builder(executor).config(config).build()?;

    // (B) submit
    let mut submit = SubmitAsyncSearchRequest::new(json!({ "name": args.name }))
        .with_wait_for_completion_timeout(args.wait);
    if let Some(keep_alive) = args.keep_alive {
        submit = submit.with_keep_alive(keep_alive);
    }
    let mut response = service.submit(submit).await?;
    print(&response)?;

    // (C) 終わるまで poll
    while response.is_running {
        if args.wait.as_nanos() == 0 {
            sleep(Duration::from_millis(100)).await;
        }
        let mut get =
            GetAsyncSearchRequest::new(&response.id)?.with_wait_for_completion_timeout(args.wait);
        if let Some(keep_alive) = args.keep_alive {
            get = get.with_keep_alive(keep_alive);
        }
        response = match service.get(get).await {
            Ok(response) => response,
            Err(err) => {
                println!("{}", serde_json::to_string_pretty(&error_body(&err))?);
                return Err(err.into());
            }
        };
        print(&response)?;
    }

    // (D) 後片付け
    service.delete(DeleteAsyncSearchRequest::new(&response.id)?)?;
    let counts = service.counts();
    info!(total = counts.total(), "done");
    service.shutdown();
    Ok(())
}
