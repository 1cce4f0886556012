use ego_tree::iter::Edge;
use scraper::{node::Element, Html, Node};

/// A flat view of a parsed document, in document order.
#[derive(Clone, Copy, Debug)]
pub enum Event<'a> {
    Open(&'a Element),
    Close(&'a str),
    Text(&'a str),
}

/// Walks the whole tree.  Void elements such as `<br>` produce an `Open`
/// immediately followed by their `Close`.
pub fn events(html: &Html) -> Vec<Event<'_>> {
    html.root_element()
        .traverse()
        .filter_map(|edge| match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) => Some(Event::Open(element)),
                Node::Text(text) => Some(Event::Text(&**text)),
                _ => None,
            },
            Edge::Close(node) => node.value().as_element().map(|e| Event::Close(e.name())),
        })
        .collect()
}
