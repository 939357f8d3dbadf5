//! Outbound shopping search links for an identified product name. Pure
//! formatting, no decisions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingLink {
    pub retailer: &'static str,
    pub url: String,
}

pub fn shopping_links(name: &str) -> Vec<ShoppingLink> {
    let query = urlencoding::encode(name);
    vec![
        ShoppingLink {
            retailer: "Google Shopping",
            url: format!("https://www.google.com/search?tbm=shop&q={query}"),
        },
        ShoppingLink {
            retailer: "Amazon",
            url: format!("https://www.amazon.com/s?k={query}"),
        },
        ShoppingLink {
            retailer: "eBay",
            url: format!("https://www.ebay.com/sch/i.html?_nkw={query}"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_three_deterministic_links() {
        let links = shopping_links("Air Jordan 1 Retro High OG");
        assert_eq!(links.len(), 3);
        assert_eq!(
            links[0].url,
            "https://www.google.com/search?tbm=shop&q=Air%20Jordan%201%20Retro%20High%20OG"
        );
        assert_eq!(
            links[1].url,
            "https://www.amazon.com/s?k=Air%20Jordan%201%20Retro%20High%20OG"
        );
        assert_eq!(
            links[2].url,
            "https://www.ebay.com/sch/i.html?_nkw=Air%20Jordan%201%20Retro%20High%20OG"
        );
    }
}
