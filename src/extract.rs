//! Home page extraction: turn the logged-in webDiplomacy HTML into board
//! records.
//!
//! Parsing is separated from fetching so it can run against fixture HTML in
//! tests. The function is pure; it never touches the store.

use crate::model::BoardRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Shown for boards whose member row carries no order-status icon.
const DEFAULT_ORDER_STATUS: &str = "No Orders Due This Phase";
/// Alt text of the unread-mail icon; every other icon alt is an order status.
const UNREAD_MAIL_ALT: &str = "Unread message";

static PANEL: Lazy<Selector> = Lazy::new(|| sel("div.gamePanelHome"));
static TITLE_BAR: Lazy<Selector> = Lazy::new(|| sel(".homeGameTitleBar"));
static MY_COUNTRY: Lazy<Selector> = Lazy::new(|| sel(".memberYourCountry"));
static PHASE: Lazy<Selector> = Lazy::new(|| sel(".gamePhase"));
static DATE: Lazy<Selector> = Lazy::new(|| sel(".gameDate"));
static MEMBER_ICONS: Lazy<Selector> = Lazy::new(|| sel(".memberUserDetail img"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Extract every board panel on the home page, in document order.
///
/// Panels without a usable game id are skipped with a warning; the rest of
/// the page is still processed.
pub fn extract_boards(html: &str) -> Vec<BoardRecord> {
    let document = Html::parse_document(html);
    document.select(&PANEL).filter_map(extract_board).collect()
}

fn extract_board(panel: ElementRef<'_>) -> Option<BoardRecord> {
    let title_bar = panel.select(&TITLE_BAR).next();
    let id = title_bar
        .and_then(|el| el.value().attr("gameid"))
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    let Some(id) = id else {
        warn!("skipping board panel without a usable gameid");
        return None;
    };

    let mut record = BoardRecord {
        id,
        name: title_bar.map(text_of).unwrap_or_default(),
        my_country: panel
            .select(&MY_COUNTRY)
            .next()
            .map(text_of)
            .unwrap_or_default(),
        date: panel.select(&DATE).next().map(text_of).unwrap_or_default(),
        phase: panel.select(&PHASE).next().map(text_of).unwrap_or_default(),
        order_status: DEFAULT_ORDER_STATUS.to_string(),
        has_mail: false,
    };

    // The member row's icons carry both signals: one icon flags unread
    // mail, any other icon's alt text is the current order status.
    for icon in panel.select(&MEMBER_ICONS) {
        match icon.value().attr("alt") {
            Some(UNREAD_MAIL_ALT) => record.has_mail = true,
            Some(alt) => record.order_status = alt.to_string(),
            None => {}
        }
    }

    Some(record)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
