use std::collections::HashSet;

use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, NodeId};

use crate::cascade::Cascade;
use crate::model::Product;
use crate::urls;

static NAME: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.name",
        &[
            "[itemprop=name]",
            "#productTitle",
            ".product-title, .product-name, .product__title",
            "h1",
            r#"meta[property="og:title"]"#,
        ],
    )
});

static PRICE: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.price",
        &[
            "[itemprop=price]",
            "#priceblock_ourprice, #priceblock_dealprice",
            ".a-price .a-offscreen",
            ".price, .product-price, [data-price]",
            r#"meta[property="product:price:amount"]"#,
        ],
    )
});

static CURRENCY: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.currency",
        &[
            "[itemprop=priceCurrency]",
            r#"meta[property="product:price:currency"]"#,
        ],
    )
});

static DESCRIPTION: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.description",
        &[
            "[itemprop=description]",
            "#productDescription, #feature-bullets",
            ".product-description, .product__description",
            r#"meta[name="description"]"#,
        ],
    )
});

static RATING: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.rating",
        &[
            "[itemprop=ratingValue]",
            "#acrPopover, .a-icon-star",
            ".rating, .product-rating, [data-rating]",
        ],
    )
});

static AVAILABILITY: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.availability",
        &["[itemprop=availability]", "#availability", ".availability, .stock"],
    )
});

static IMAGES: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "product.images",
        &[
            "img[itemprop=image]",
            "#landingImage, #imgTagWrapperId img",
            ".product-image img, .product__media img, .gallery img",
            r#"meta[property="og:image"]"#,
        ],
    )
});

const CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
    ('₹', "INR"),
];

pub fn extract(doc: &LiveDocument) -> Option<Product> {
    let root = doc.arena().root();
    let name = NAME.first_text(doc, root);
    let price = PRICE.first_text(doc, root);
    if name.is_none() && price.is_none() {
        return None;
    }
    let currency = CURRENCY.first_text(doc, root).or_else(|| {
        let price = price.as_deref()?;
        CURRENCY_SYMBOLS
            .iter()
            .find(|(symbol, _)| price.contains(*symbol))
            .map(|(_, code)| code.to_string())
    });
    Some(Product {
        name,
        price,
        currency,
        description: DESCRIPTION.first_text(doc, root),
        rating: RATING.first_text(doc, root),
        availability: AVAILABILITY
            .first_match(doc, root)
            .and_then(|(_, nodes)| nodes.first().map(|node| availability_of(doc, *node))),
        images: images(doc, root),
    })
}

fn availability_of(doc: &LiveDocument, node: NodeId) -> String {
    // schema.org availability is usually a `link` or `meta` with a URL value
    let raw = doc
        .attr(node, "href")
        .or_else(|| doc.attr(node, "content"))
        .map(str::to_string)
        .unwrap_or_else(|| doc.text(node));
    raw.rsplit('/').next().unwrap_or_default().trim().to_string()
}

fn images(doc: &LiveDocument, root: NodeId) -> Vec<String> {
    let Some((_, nodes)) = IMAGES.first_match(doc, root) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter_map(|node| {
            let source = doc
                .attr(node, "src")
                .or_else(|| doc.attr(node, "data-src"))
                .or_else(|| doc.attr(node, "content"))?;
            urls::absolutize(doc.url(), source)
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
