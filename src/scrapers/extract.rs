use crate::models::ListingRecord;
use scraper::{ElementRef, Html, Selector};

pub const LISTING_CARD: &str = ".listingCard";
pub const NO_RESULTS: &str = ".no_results";
pub const CHALLENGE: &str = "#px-captcha";

const LAZYLOAD_ATTR: &str = "data-flickity-lazyload";
const FEATURED_ATTR: &str = "data-featured-event-category";

/// Reads listing cards out of a rendered results document
pub struct ResultExtractor {
    card: Selector,
    no_results: Selector,
    challenge: Selector,
    anchor: Selector,
    address: Selector,
    detail_item: Selector,
    detail_text: Selector,
    bed_icon: Selector,
    bath_icon: Selector,
    measure_icon: Selector,
    top_label: Selector,
    check_icon: Selector,
    bottom: Selector,
    label: Selector,
    fine_print: Selector,
    image: Selector,
    price: Selector,
}

#[derive(Default)]
struct Details {
    beds: Option<String>,
    bath: Option<String>,
    sqft: Option<String>,
}

#[derive(Default)]
struct Badges {
    featured: Option<String>,
    sponsored: bool,
    verified: bool,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

impl ResultExtractor {
    pub fn new() -> Self {
        Self {
            card: selector(LISTING_CARD),
            no_results: selector(NO_RESULTS),
            challenge: selector(CHALLENGE),
            anchor: selector("a"),
            address: selector("address"),
            detail_item: selector(".listingDetailDefinitions > .listingDetailDefinitionsItem"),
            detail_text: selector(".listingDetailDefinitionsText"),
            bed_icon: selector(".listingDetailDefinitionsIcon--bed"),
            bath_icon: selector(".listingDetailDefinitionsIcon--bath"),
            measure_icon: selector(".listingDetailDefinitionsIcon--measure"),
            top_label: selector(".listingCardTop .listingCardLabel"),
            check_icon: selector(".listingCardLabel-checkIcon"),
            bottom: selector(".listingCardBottom"),
            label: selector(".listingCardLabel"),
            fine_print: selector(".listingCardBottom--finePrint"),
            image: selector("img"),
            price: selector(".price"),
        }
    }

    pub fn has_challenge(&self, document: &Html) -> bool {
        document.select(&self.challenge).next().is_some()
    }

    pub fn has_listings(&self, document: &Html) -> bool {
        document.select(&self.card).next().is_some()
    }

    pub fn has_no_results_marker(&self, document: &Html) -> bool {
        document.select(&self.no_results).next().is_some()
    }

    /// One record per listing card, in document order
    pub fn extract(&self, document: &Html) -> Vec<ListingRecord> {
        document
            .select(&self.card)
            .enumerate()
            .map(|(index, card)| self.extract_card(index, card))
            .collect()
    }

    fn extract_card(&self, index: usize, card: ElementRef<'_>) -> ListingRecord {
        let anchor = card.select(&self.anchor).next();
        let address = card.select(&self.address).next();
        let details = self.details(card);
        let badges = self.badges(card);

        ListingRecord {
            index,
            id: anchor
                .and_then(|a| attr(a, "data-label-id"))
                .and_then(|label| label.split('-').next().map(str::to_string)),
            address: address.map(inner_text),
            address_url: address
                .and_then(|addr| addr.select(&self.anchor).next())
                .and_then(|a| attr(a, "href")),
            geo: anchor.and_then(|a| attr(a, "data-map-points").or_else(|| attr(a, "se:map:point"))),
            url: anchor.and_then(|a| attr(a, "href")),
            summary: card
                .select(&self.bottom)
                .next()
                .and_then(|bottom| bottom.select(&self.label).next())
                .map(inner_text),
            label: anchor
                .and_then(|a| a.value().attr("aria-labelledby"))
                .and_then(|id| find_by_id(card, id))
                .map(inner_text),
            images: card.select(&self.image).map(image_url).collect(),
            listing_by: card.select(&self.fine_print).next().map(inner_text),
            beds: details.beds,
            bath: details.bath,
            sqft: details.sqft,
            price: card.select(&self.price).next().map(inner_text),
            featured: badges.featured,
            sponsored: badges.sponsored,
            verified: badges.verified,
        }
    }

    /// Beds, baths and area from the definition list, keyed by icon class
    fn details(&self, card: ElementRef<'_>) -> Details {
        let mut details = Details::default();
        for item in card.select(&self.detail_item) {
            let value = item.select(&self.detail_text).next().map(inner_text);
            if item.select(&self.bed_icon).next().is_some() {
                details.beds = value;
            } else if item.select(&self.bath_icon).next().is_some() {
                details.bath = value;
            } else if item.select(&self.measure_icon).next().is_some() {
                details.sqft = value.map(|text| first_line(&text));
            }
        }
        details
    }

    /// First matching condition wins per label; separate labels can each set a badge.
    fn badges(&self, card: ElementRef<'_>) -> Badges {
        let mut badges = Badges::default();
        for label in card.select(&self.top_label) {
            if let Some(category) = attr(label, FEATURED_ATTR).filter(|c| !c.is_empty()) {
                badges.featured = Some(category);
            } else if inner_text(label).contains("Sponsored") {
                badges.sponsored = true;
            } else if label.select(&self.check_icon).next().is_some() {
                badges.verified = true;
            }
        }
        badges
    }
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}

fn image_url(img: ElementRef<'_>) -> Option<String> {
    attr(img, LAZYLOAD_ATTR).or_else(|| attr(img, "src"))
}

fn find_by_id<'a>(scope: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().id() == Some(id))
}

fn first_line(text: &str) -> String {
    text.split('\n').next().unwrap_or_default().trim().to_string()
}

/// Approximates rendered text: whitespace collapsed within a line, blank lines dropped.
fn inner_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
