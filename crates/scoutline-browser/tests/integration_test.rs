use scoutline_browser::{BrowserActions, BrowserEngine, RequestInterceptor};
use scoutline_core::BrowserConfig;
use std::time::{Duration, Instant};

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_browser_engine_creation() {
    let engine = BrowserEngine::new().await;
    assert!(engine.is_ok(), "Failed to create browser engine");
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_navigation() {
    let engine = BrowserEngine::new().await.unwrap();

    let response = engine.navigate("https://example.com").await.unwrap();
    assert!(response.is_success());
    assert!(response.content.contains("Example Domain"));
    assert_eq!(engine.count("h1").await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_navigation_throttle() {
    let settings = BrowserConfig {
        min_navigation_delay_ms: 1500,
        ..BrowserConfig::default()
    };
    let engine = BrowserEngine::launch(&settings).await.unwrap();

    engine.navigate("https://example.com").await.unwrap();

    // Second navigation to the same domain waits out the delay instead of failing
    let started = Instant::now();
    assert!(engine.navigate("https://example.com/").await.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_missing_selector_click() {
    let engine = BrowserEngine::new().await.unwrap();
    engine.navigate("https://example.com").await.unwrap();

    let err = engine.click("ul.does-not-exist > li", 0).await.unwrap_err();
    assert!(err.to_string().contains("selector not found"));
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_interception_install() {
    let engine = BrowserEngine::new().await.unwrap();
    engine.navigate("https://example.com").await.unwrap();

    let mut stream = engine.intercept("*/nothing-fires-this/*").await.unwrap();
    assert!(stream.try_recv().is_err());
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_dropped_interception_lets_page_load() {
    let engine = BrowserEngine::new().await.unwrap();

    // A listener whose receiver is gone must not keep pausing matching requests
    let stream = engine.intercept("*example.com/*").await.unwrap();
    drop(stream);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = engine.navigate("https://example.com/").await.unwrap();
    assert!(response.content.contains("Example Domain"));

    let mut again = engine.intercept("*/nothing-fires-this/*").await.unwrap();
    assert!(again.try_recv().is_err());
}
