use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};
use utoipa::ToSchema;

/// hard cap on `page[limit]`, larger requests are clamped down to this
pub const MAX_RESULTS_LIMIT: i64 = 20;

const OFFSET_PARAM: &str = "page[offset]";
const LIMIT_PARAM: &str = "page[limit]";

/// Validated offset pagination window of a list request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

/// Outcome of parsing the pagination query parameters.
///
/// `errors` fail the request, `warnings` only report adjustments (such as
/// clamping an oversized limit) and let the request proceed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedPageParams {
    pub params: PageParams,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Parses `page[limit]` / `page[offset]` from a raw query string.
///
/// `page[limit]` is required and positive, `page[offset]` optional and non
/// negative, both reported with field prefixed machine stable messages
pub fn parse_page_params(query: Option<&str>) -> ParsedPageParams {
    let mut parsed = ParsedPageParams::default();

    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let first_value = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    if let Some(raw_offset) = first_value(OFFSET_PARAM) {
        match raw_offset.parse::<i64>() {
            Ok(offset) if offset >= 0 => parsed.params.offset = offset,
            _ => parsed
                .errors
                .push(format!("{OFFSET_PARAM}: must be non-negative integer")),
        }
    }

    match first_value(LIMIT_PARAM) {
        None => parsed
            .errors
            .push(format!("{LIMIT_PARAM}: missing required parameter")),
        Some(raw_limit) => {
            match raw_limit.parse::<i64>() {
                Ok(limit) if limit > 0 => parsed.params.limit = limit,
                _ => parsed
                    .errors
                    .push(format!("{LIMIT_PARAM}: must be a positive integer")),
            }
            if parsed.params.limit > MAX_RESULTS_LIMIT {
                parsed.params.limit = MAX_RESULTS_LIMIT;
                parsed.warnings.push(format!(
                    "{LIMIT_PARAM}: must be less than or equal to {MAX_RESULTS_LIMIT}"
                ));
            }
        }
    }

    parsed
}

/// The four page boundary offsets computed for a listing of `total` items.
///
/// `prev` and `next` are absent when the corresponding link must not be
/// emitted (first and last page respectively)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLinkOffsets {
    pub first: i64,
    pub last: i64,
    pub prev: Option<i64>,
    pub next: Option<i64>,
}

/// Computes the page boundary offsets.
///
/// `last` is the largest limit aligned offset boundary, `(total / limit) *
/// limit`, which addresses an empty page when total is an exact multiple of
/// the limit. A `prev` overshooting `last` snaps back to it
pub fn link_offsets(total: i64, params: PageParams) -> PageLinkOffsets {
    let last = (total / params.limit) * params.limit;

    let mut prev = params.offset - params.limit;
    if prev > last {
        prev = last;
    }

    let next = params.offset + params.limit;

    PageLinkOffsets {
        first: 0,
        last,
        prev: (prev >= 0).then_some(prev),
        next: (next <= last).then_some(next),
    }
}

/// rebuilds `base` with `page[offset]` overwritten, every other query
/// parameter is preserved as sent
pub fn with_page_offset(base: &Url, offset: i64) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != OFFSET_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut link = base.clone();
    {
        let mut query = link.query_pairs_mut();
        query.clear();
        for (key, value) in &retained {
            query.append_pair(key, value);
        }
        query.append_pair(OFFSET_PARAM, &offset.to_string());
    }
    link
}

/// Absolute pagination links of a listing, preserving the original request
/// URL on every link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// builds the links for a request made to `base` that found `total` items
    pub fn for_request(base: &Url, total: i64, params: PageParams) -> PaginationLinks {
        let offsets = link_offsets(total, params);

        PaginationLinks {
            first: with_page_offset(base, offsets.first).to_string(),
            last: with_page_offset(base, offsets.last).to_string(),
            prev: offsets
                .prev
                .map(|offset| with_page_offset(base, offset).to_string()),
            next: offsets
                .next
                .map(|offset| with_page_offset(base, offset).to_string()),
        }
    }
}
