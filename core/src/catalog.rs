use rand::Rng;

/// Static, read-only sample record substituted when no conclusive real
/// identification is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub brand: &'static str,
    pub price: &'static str,
    pub confidence: &'static str,
    pub image: &'static str,
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Stan Smith",
        brand: "Adidas",
        price: "$100.00",
        confidence: "95%",
        image: "assets/samples/stan-smith.jpg",
    },
    CatalogEntry {
        name: "990v6",
        brand: "New Balance",
        price: "$199.99",
        confidence: "92%",
        image: "assets/samples/990v6.jpg",
    },
    CatalogEntry {
        name: "Chuck 70 High Top",
        brand: "Converse",
        price: "$85.00",
        confidence: "94%",
        image: "assets/samples/chuck-70.jpg",
    },
    CatalogEntry {
        name: "Old Skool",
        brand: "Vans",
        price: "$70.00",
        confidence: "93%",
        image: "assets/samples/old-skool.jpg",
    },
    CatalogEntry {
        name: "Suede Classic XXI",
        brand: "Puma",
        price: "$75.00",
        confidence: "91%",
        image: "assets/samples/suede-classic.jpg",
    },
];

/// Fixed non-empty set of pre-identified sample products.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackCatalog;

impl FallbackCatalog {
    pub fn entries(&self) -> &'static [CatalogEntry] {
        ENTRIES
    }

    /// Picks uniformly at random over the set. The set is guaranteed
    /// non-empty, so this never fails.
    pub fn pick_random(&self) -> &'static CatalogEntry {
        let idx = rand::rng().random_range(0..ENTRIES.len());
        &ENTRIES[idx]
    }
}
