use std::time::Duration;

use storefront_carousel::config::PageConfig;
use storefront_carousel::container::{DomEvent, Target};
use storefront_carousel::error::Error;
use storefront_carousel::events::CarouselChange;
use storefront_carousel::page::Page;
use storefront_carousel::script::Script;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const PAGE: &str = r#"
carousels:
  - id: hero
    slides: 4
    indicators: 4
    prev: true
    next: true
    data:
      interval: "1000"
  - id: products
    slides: 3
    next: true
    data:
      autoplay: "false"
      loop: "false"
"#;

fn page_config() -> PageConfig {
    PageConfig::from_yaml_str(PAGE).unwrap().validated().unwrap()
}

fn drain(rx: &mut mpsc::Receiver<CarouselChange>) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    while let Ok(change) = rx.try_recv() {
        out.push((change.carousel, change.current_index));
    }
    out
}

#[tokio::test(start_paused = true)]
async fn carousels_on_a_page_are_independent() {
    let (tx, mut rx) = mpsc::channel(64);
    let page = Page::attach(&page_config(), tx, CancellationToken::new()).unwrap();
    assert_eq!(page.ids().collect::<Vec<_>>(), vec!["hero", "products"]);

    page.dispatch("products", DomEvent::click(Target::Next))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let hero = page.carousel("hero").unwrap().snapshot().await.unwrap();
    let products = page.carousel("products").unwrap().snapshot().await.unwrap();
    assert_eq!(hero.current_index, 2);
    assert!(hero.autoplay_running);
    assert_eq!(products.current_index, 1);
    assert!(!products.autoplay_running);

    let products_changes: Vec<usize> = drain(&mut rx)
        .into_iter()
        .filter(|(id, _)| id == "products")
        .map(|(_, idx)| idx)
        .collect();
    assert_eq!(products_changes, vec![0, 1]);

    let detached = page.teardown().await;
    assert_eq!(detached.len(), 2);
    assert!(detached.values().all(|c| c.listeners().is_empty()));
    // Options were resolved from the attributes the container carries.
    let products = &detached["products"];
    assert_eq!(products.dataset().get("loop").map(String::as_str), Some("false"));
    assert_eq!(products.dataset().get("autoplay").map(String::as_str), Some("false"));
}

#[tokio::test(start_paused = true)]
async fn unknown_carousel_is_an_error() {
    let (tx, _rx) = mpsc::channel(8);
    let page = Page::attach(&page_config(), tx, CancellationToken::new()).unwrap();
    let err = page
        .dispatch("footer", DomEvent::click(Target::Next))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCarousel(id) if id == "footer"));
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn page_cancellation_stops_every_controller() {
    let (tx, _rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let page = Page::attach(&page_config(), tx, cancel.clone()).unwrap();
    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(matches!(
        page.carousel("hero").unwrap().snapshot().await,
        Err(Error::Detached)
    ));
    // Already stopped controllers are skipped during teardown.
    assert!(page.teardown().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn script_replays_against_page() {
    let script = Script::from_yaml_str(
        r#"
steps:
  - at-ms: 0
    carousel: products
    event: touch-start
    x: 300
  - at-ms: 10
    carousel: products
    event: touch-move
    x: 200
  - at-ms: 20
    carousel: products
    event: touch-end
  - at-ms: 700
    carousel: products
    event: jump-to
    index: 2
  - at-ms: 800
    carousel: missing
    event: advance
  - at-ms: 900
    carousel: products
    event: destroy
  - at-ms: 1000
    carousel: products
    event: advance
"#,
    )
    .unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let page = Page::attach(&page_config(), tx, CancellationToken::new()).unwrap();
    page.carousel("hero").unwrap().stop_autoplay().await.unwrap();
    script.replay(&page).await.unwrap();

    let products: Vec<usize> = drain(&mut rx)
        .into_iter()
        .filter(|(id, _)| id == "products")
        .map(|(_, idx)| idx)
        .collect();
    assert_eq!(products, vec![0, 1, 2]);

    let detached = page.teardown().await;
    assert_eq!(detached.keys().collect::<Vec<_>>(), vec!["hero"]);
}

#[tokio::test(start_paused = true)]
async fn data_attributes_configure_each_controller() {
    let (tx, _rx) = mpsc::channel(64);
    let page = Page::attach(&page_config(), tx, CancellationToken::new()).unwrap();

    for _ in 0..4 {
        page.dispatch("products", DomEvent::click(Target::Next))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
    }
    let products = page.carousel("products").unwrap().snapshot().await.unwrap();
    assert_eq!(products.current_index, 2, "loop=\"false\" clamps at the last slide");
    assert!(!products.autoplay_running);

    // hero's data-interval of 1000 ms has fired twice by now.
    let hero = page.carousel("hero").unwrap().snapshot().await.unwrap();
    assert_eq!(hero.current_index, 2);
    page.teardown().await;
}
