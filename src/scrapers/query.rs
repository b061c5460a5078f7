use crate::error::ScoutError;
use crate::scrapers::lookup::ReferenceData;
use crate::scrapers::types::{FilterInput, FilterSpec, Price, TransactionKind};
use tracing::debug;

pub const REQUIRED_ARGS: &str = "Required --rent/--buy and --locations";

const REGION: &str = "nyc";
/// Percent-encoded `|`
const SEGMENT_SEPARATOR: &str = "%7C";

/// Maps human search filters onto the site's search URL dialect
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    reference: ReferenceData,
    base_url: String,
}

impl QueryTranslator {
    pub fn new(reference: ReferenceData, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { reference, base_url }
    }

    /// Validate raw input and resolve names to ids
    pub fn resolve(&self, input: &FilterInput) -> Result<FilterSpec, ScoutError> {
        debug!(?input, "request args");

        let transaction = match (input.rent, input.buy) {
            (true, false) => TransactionKind::Rent,
            (false, true) => TransactionKind::Buy,
            _ => return Err(ScoutError::validation(REQUIRED_ARGS)),
        };
        let raw_locations =
            non_empty(&input.locations).ok_or_else(|| ScoutError::validation(REQUIRED_ARGS))?;

        let locations = self.reference.areas.resolve_all(raw_locations);
        if locations.is_empty() {
            return Err(ScoutError::validation(format!(
                "No known location in '{}'",
                raw_locations
            )));
        }

        let unit_types = non_empty(&input.unit_types)
            .map(|raw| self.reference.unit_types.resolve_all(raw))
            .unwrap_or_default();

        let min_price = parse_price("minPrice", &input.min_price)?;
        let max_price = parse_price("maxPrice", &input.max_price)?;

        let page = match non_empty(&input.page) {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                ScoutError::validation(format!("Invalid page '{}'", raw))
            })?),
            None => None,
        };

        let sort = non_empty(&input.sort_by).and_then(|raw| self.reference.sort_orders.resolve(raw));

        Ok(FilterSpec {
            transaction,
            locations,
            unit_types,
            beds: non_empty(&input.beds).map(|raw| raw.trim().to_string()),
            min_price,
            max_price,
            no_fee: input.no_fee,
            sort,
            page,
        })
    }

    pub fn build_url(&self, filter: &FilterSpec) -> String {
        let mut url = format!(
            "{}{}/{}/",
            self.base_url,
            filter.transaction.path_segment(),
            REGION
        );

        let mut segments = Vec::new();
        if let Some(price) = price_segment(filter.min_price, filter.max_price) {
            segments.push(price);
        }
        segments.push(format!("area:{}", join_ids(&filter.locations)));
        if !filter.unit_types.is_empty() {
            segments.push(format!("type:{}", join_ids(&filter.unit_types)));
        }
        if let Some(beds) = filter.beds.as_deref().and_then(bed_segment) {
            segments.push(beds);
        }
        if filter.no_fee {
            segments.push("no_fee:1".to_string());
        }
        url.push_str(&segments.join(SEGMENT_SEPARATOR));

        let mut params = Vec::new();
        if let Some(page) = filter.page.filter(|page| *page > 0) {
            params.push(format!("page={}", page));
        }
        if let Some(sort) = filter.sort {
            params.push(format!("sort_by={}", sort));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        url
    }
}

/// Bed-count expression to filter segment; `None` means no bed filter.
pub fn bed_segment(expr: &str) -> Option<String> {
    if expr == "studio" {
        Some("beds:0".to_string())
    } else if matches!(expr, "0" | "1" | "2" | "3" | "4") || expr.contains('-') {
        Some(format!("beds:{}", expr))
    } else if expr.starts_with('<') || expr.starts_with('>') {
        Some(format!("beds{}", expr))
    } else {
        expr.strip_suffix('+').map(|min| format!("beds>={}", min))
    }
}

fn price_segment(min: Option<Price>, max: Option<Price>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("price:{}-{}", min, max)),
        (Some(min), None) => Some(format!("price:{}-", min)),
        (None, Some(max)) => Some(format!("price:-{}", max)),
        (None, None) => None,
    }
}

fn parse_price(field: &str, raw: &Option<String>) -> Result<Option<Price>, ScoutError> {
    match non_empty(raw) {
        Some(raw) => Price::parse(raw)
            .map(Some)
            .ok_or_else(|| ScoutError::validation(format!("Invalid {} '{}'", field, raw))),
        None => Ok(None),
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
