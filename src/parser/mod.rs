pub mod events;
pub mod extract;
pub mod scanner;

use scraper::Html;

use crate::schema::ParseResult;

pub fn parse_document(text: &str) -> ParseResult {
    extract::extract(&scanner::scan(&Html::parse_document(text)))
}
