//! Run a search or a detail lookup through the real OMDb client and print the proxy's JSON.
//! Usage:
//!   cargo run --bin omdb_props -- movie <imdb_id> [short|full]
//!   cargo run --bin omdb_props -- search <text> [page]
//! Requires OMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, bail, Result};
use dotenvy::dotenv;
use omdb_proxy::config::Config;
use omdb_proxy::omdb::{OmdbApi, OmdbClient};
use omdb_proxy::transform::{self, PosterLinks};
use omdb_proxy::validate::{self, DetailParams, SearchParams};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --bin omdb_props -- movie <imdb_id> [short|full]");
        eprintln!("       cargo run --bin omdb_props -- search <text> [page]");
        std::process::exit(1);
    }

    let config = Config::from_env()?;
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("OMDB_API_KEY not set"))?;
    let client = OmdbClient::new(&config)?;
    let links = PosterLinks::new(&config.poster_url, &api_key);

    let output = match args[1].as_str() {
        "movie" => {
            let params = DetailParams {
                plot: args.get(3).cloned(),
            };
            let lookup = validate::validate_lookup(&args[2], &params)?;
            match client.fetch_by_id(&lookup.id, lookup.plot).await? {
                Some(record) => {
                    serde_json::to_value(transform::to_movie_detail(record, &lookup.id, &links))?
                }
                None => bail!("OMDb has no record for {}", lookup.id),
            }
        }
        "search" => {
            let params = SearchParams {
                query: Some(args[2].clone()),
                page: args.get(3).cloned(),
                ..Default::default()
            };
            let query = validate::validate_search(&params)?;
            let body = client.search(&query).await?;
            serde_json::to_value(transform::to_search_result_page(body, query.page, &links))?
        }
        other => bail!("unknown mode '{other}', expected 'movie' or 'search'"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
