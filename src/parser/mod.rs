//! Price extraction from polled HTML
//!
//! The pipeline reads exactly one numeric field from each page: the text of
//! the first `span#price` element. Extraction failure is non-fatal and
//! defaults the value to zero; the evaluation step downstream then treats
//! the page as below threshold.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

lazy_static! {
    static ref PRICE_SELECTOR: Selector =
        Selector::parse("span#price").expect("invalid CSS selector: span#price");
}

/// Extract the price from `html`
///
/// Returns the first `span#price` text parsed as a float, or `0.0` when the
/// element is missing or its text is not numeric.
pub fn extract_price(html: &str) -> f64 {
    let document = Html::parse_document(html);

    document
        .select(&PRICE_SELECTOR)
        .next()
        .map(|span| span.text().collect::<String>())
        .and_then(|text| text.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_price() {
        let html = r#"<html><body><span id="price">250</span></body></html>"#;
        assert_eq!(extract_price(html), 250.0);
    }

    #[test]
    fn test_extract_decimal_price() {
        let html = r#"<span id="price"> 319.99 </span>"#;
        assert_eq!(extract_price(html), 319.99);
    }

    #[test]
    fn test_missing_element_defaults_to_zero() {
        let html = "<html><body><p>no price here</p></body></html>";
        assert_eq!(extract_price(html), 0.0);
    }

    #[test]
    fn test_non_numeric_text_defaults_to_zero() {
        let html = r#"<span id="price">call us</span>"#;
        assert_eq!(extract_price(html), 0.0);
    }

    #[test]
    fn test_first_of_multiple_spans_wins() {
        let html = r#"<span id="price">100</span><span id="price">200</span>"#;
        assert_eq!(extract_price(html), 100.0);
    }
}
