use market_feed::{PaginationController, PageView};
use std::time::Instant;

fn print_page(view: &PageView) {
    println!(
        "Page {} (source: {}, updated: {})",
        view.current_page,
        view.provenance.map(|p| p.as_str()).unwrap_or("none"),
        view.last_updated
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
    for entry in &view.entries {
        let change = entry
            .price_change_percentage_24h
            .map(|c| format!("{:+.2}%", c))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "   #{:<4} {:<8} {:<24} ${:>14.2}  {}",
            entry.market_cap_rank,
            entry.ticker(),
            entry.name,
            entry.current_price,
            change
        );
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let controller = PaginationController::new()?;

    println!("Browsing market pages...");
    println!("-------------------------------------------");

    // 1. First page triggers batch 1
    let start = Instant::now();
    let view = controller.go_to_page(1).await?;
    println!("1. First page loaded in {:?}", start.elapsed());
    print_page(&view);

    // 2. Next page is served from the cache
    let start = Instant::now();
    let view = controller.next_page().await?;
    println!("2. Next page loaded in {:?} (cached)", start.elapsed());
    print_page(&view);

    // 3. Page 12 crosses into batch 2
    let start = Instant::now();
    let view = controller.goto_page_input("12").await?;
    println!("3. Page 12 loaded in {:?}", start.elapsed());
    print_page(&view);

    // 4. Invalid input is rejected
    if let Err(e) = controller.goto_page_input("-5").await {
        println!("4. Rejected input: {}", e);
        println!();
    }

    let metrics = controller.get_metrics().await;
    let health = controller.health_check().await;

    println!("-------------------------------------------");
    println!("Summary:");
    println!("- Cached entries:     {}", controller.cached_entries().await);
    println!("- Last batch:         {}", controller.last_fetched_batch().await);
    println!(
        "- Remote latency:     p50={:.0}ms p99={:.0}ms",
        metrics.latency_p50_ms, metrics.latency_p99_ms
    );
    println!(
        "- Fallbacks:          local={} synthetic={}",
        metrics.local_fallbacks, metrics.synthetic_fallbacks
    );
    println!(
        "- Health:             {:?} ({})",
        health.status,
        health.message.unwrap_or_default()
    );

    Ok(())
}
