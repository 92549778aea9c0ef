use anyhow::Result;
use std::path::Path;

use super::{build_service, load_config, open_store, provider};
use crate::service::SearchRequest;

/// Run a hybrid search and print the ranked results.
pub async fn run(root: &Path, query: &str, k: Option<i64>, json: bool) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(&config, root).await?;
    let service = build_service(&config, provider(&config)?, store);

    let response = service.search(SearchRequest::new(query, k)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("No results found for: {}", query);
        println!("\nMake sure artifacts were ingested and embedded ('heritage-lens embed').");
        return Ok(());
    }

    println!("Found {} results for: \"{}\"\n", response.results.len(), query);

    for (i, result) in response.results.iter().enumerate() {
        let artifact = &result.artifact;
        println!(
            "{}. {} [{}{}] (score: {:.3}, vector: {:.3}, text: {:.3})",
            i + 1,
            artifact.title,
            artifact.region,
            if artifact.period.is_empty() {
                String::new()
            } else {
                format!(", {}", artifact.period)
            },
            result.score,
            result.vector_score,
            result.text_score
        );

        if !artifact.description.is_empty() {
            println!("   {}", truncate(&artifact.description, 160));
        }
        if !artifact.themes.is_empty() {
            println!("   themes: {}", artifact.themes.join(", "));
        }
        if let Some(link) = &artifact.reference_link {
            println!("   {}", link);
        }
        println!();
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
