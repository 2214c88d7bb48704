// Tests for end-of-run reports

use indexcast_core::crawl::CrawlSummary;
use indexcast_core::error::{ConfigError, SiteSkip};
use indexcast_core::outcome::{BroadcastResult, Tally};
use indexcast_core::report::{
    BroadcastReport, CrawlReport, ReportFormat, SkippedSite, describe_failure,
};
use indexcast_scanner::{FailureStage, SitemapFailure};

fn summary(domain: &str, urls: usize) -> CrawlSummary {
    CrawlSummary {
        domain: domain.to_string(),
        urls_stored: urls,
        documents_fetched: 2,
        rejected_locs: 0,
        failures: vec![],
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("txt"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), None);
}

// ============================================================================
// Crawl Report Tests
// ============================================================================

#[test]
fn test_crawl_report_counts() {
    let mut report = CrawlReport::new();
    report.record("a.com", Ok(summary("a.com", 10)));
    report.record("b.com", Ok(summary("b.com", 5)));
    report.record(
        "c.com",
        Err(ConfigError::MissingSitemaps {
            domain: "c.com".to_string(),
        }
        .into()),
    );

    assert_eq!(report.sites.len(), 2);
    assert_eq!(report.total_urls(), 15);
    assert_eq!(
        report.skipped,
        vec![SkippedSite {
            domain: "c.com".to_string(),
            reason: "c.com: no sitemaps configured".to_string(),
        }]
    );
}

#[test]
fn test_crawl_report_text() {
    let mut report = CrawlReport::new();
    let mut with_failure = summary("a.com", 3);
    with_failure.failures.push(SitemapFailure {
        url: "https://a.com/broken.xml".to_string(),
        stage: FailureStage::Fetch,
        reason: "HTTP status 404".to_string(),
    });
    with_failure.failures.push(SitemapFailure {
        url: "https://a.com/page.xml".to_string(),
        stage: FailureStage::Parse,
        reason: "Parse error: not a sitemap index or urlset".to_string(),
    });
    report.record("a.com", Ok(with_failure));
    report.record(
        "b.com",
        Err(ConfigError::MissingSitemaps {
            domain: "b.com".to_string(),
        }
        .into()),
    );

    let text = report.render(ReportFormat::Text).unwrap();
    assert!(text.contains("# Crawl summary:"));
    assert!(text.contains("Sites crawled: 1"));
    assert!(text.contains("Sites skipped: 1"));
    assert!(text.contains("URLs stored: 3"));
    assert!(text.contains("## a.com"));
    assert!(text.contains("3 URLs stored from 2 sitemap documents"));
    assert!(text.contains("✗ https://a.com/broken.xml (fetch failed): HTTP status 404"));
    assert!(text.contains("✗ https://a.com/page.xml (parse failed): Parse error"));
    assert!(text.contains("## Skipped"));
    assert!(text.contains("- b.com: b.com: no sitemaps configured"));
}

#[test]
fn test_crawl_report_json() {
    let mut report = CrawlReport::new();
    report.record("a.com", Ok(summary("a.com", 4)));

    let json = report.render(ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["sites"][0]["domain"], "a.com");
    assert_eq!(value["sites"][0]["urls_stored"], 4);
    assert_eq!(value["skipped"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Broadcast Report Tests
// ============================================================================

fn ping_results() -> Vec<BroadcastResult> {
    vec![
        BroadcastResult::success("Pingomatic", "https://a.com/", 200),
        BroadcastResult::fault("Twingly", "https://a.com/", 200, "<fault>bad</fault>".to_string()),
        BroadcastResult::transport_error("Dead", "https://a.com/", "connection refused".to_string()),
    ]
}

#[test]
fn test_broadcast_report_tally() {
    let mut report = BroadcastReport::new("Ping");
    report.record::<ConfigError>("a.com", Ok(ping_results()));
    report.record::<ConfigError>("b.com", Ok(vec![BroadcastResult::success("X", "https://b.com/", 200)]));
    report.record(
        "c.com",
        Err(ConfigError::MissingServices {
            domain: "c.com".to_string(),
        }),
    );

    assert_eq!(
        report.tally(),
        Tally {
            success: 2,
            fault: 1,
            transport_error: 1
        }
    );
    assert_eq!(report.sites[0].tally.failed(), 2);
    assert_eq!(report.skipped.len(), 1);
}

#[test]
fn test_broadcast_report_text() {
    let mut report = BroadcastReport::new("IndexNow");
    report.record::<ConfigError>("a.com", Ok(ping_results()));
    report.record(
        "b.com",
        Err(SiteSkip::NoCachedUrls {
            domain: "b.com".to_string(),
        }),
    );

    let text = report.render(ReportFormat::Text).unwrap();
    assert!(text.contains("# IndexNow summary:"));
    assert!(text.contains("Requests sent: 3"));
    assert!(text.contains("Succeeded: 1"));
    assert!(text.contains("Faults: 1"));
    assert!(text.contains("Transport errors: 1"));
    assert!(text.contains("1 succeeded, 2 failed"));
    assert!(text.contains("⚠ [Twingly] https://a.com/ (HTTP 200): <fault>bad</fault>"));
    assert!(text.contains("✗ [Dead] https://a.com/ (no response): connection refused"));
    assert!(!text.contains("[Pingomatic]"));
    assert!(text.contains("- b.com: b.com: crawl stored no URLs"));
}

#[test]
fn test_broadcast_report_json() {
    let mut report = BroadcastReport::new("Ping");
    report.record::<ConfigError>("a.com", Ok(ping_results()));

    let json = report.render(ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["title"], "Ping");
    assert_eq!(value["sites"][0]["tally"]["fault"], 1);
    assert_eq!(value["sites"][0]["results"][1]["outcome"], "Fault");
    assert_eq!(value["sites"][0]["results"][2]["http_status"], serde_json::Value::Null);
}

#[test]
fn test_describe_failure_flattens_newlines() {
    let result = BroadcastResult::fault("Bing", "https://a.com/x", 422, "line one\nline two".to_string());
    assert_eq!(
        describe_failure(&result),
        "⚠ [Bing] https://a.com/x (HTTP 422): line one line two"
    );

    let bare = BroadcastResult::fault("Bing", "https://a.com/x", 500, String::new());
    assert_eq!(describe_failure(&bare), "⚠ [Bing] https://a.com/x (HTTP 500)");
}
