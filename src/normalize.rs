//! Normalization of raw provider records into hotel and flight results
//!
//! Provider actors disagree on field names, types and presence. Every output
//! field is resolved through a [`FieldChain`]: an ordered list of
//! `(path, parser)` candidates where the first candidate that parses wins and
//! a fixed default applies when none does. Normalization never fails; a
//! record without a usable identity field is dropped.

use crate::client::RawRecord;
use crate::config::SourceConfig;
use crate::deeplink;
use crate::{FlightResult, FlightSearch, HotelResult, HotelSearch, Location, Price};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

pub type Parser<T> = fn(&Value) -> Option<T>;

/// Ordered candidates for one normalized field
pub struct FieldChain<T: 'static> {
    pub field: &'static str,
    pub candidates: &'static [(&'static str, Parser<T>)],
}

impl<T> FieldChain<T> {
    /// First candidate that is present and parses
    pub fn resolve(&self, record: &Value) -> Option<T> {
        self.candidates
            .iter()
            .find_map(|(path, parse)| lookup(record, path).and_then(parse))
    }
}

/// Walk a dotted path such as `address.full` or `images.0.url`.
/// `null` counts as absent.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, key| match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .filter(|value| !value.is_null())
}

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| {
        Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("number pattern is valid")
    })
}

/// First numeric substring of `text`, e.g. `"€1,234.50 per night"` → `1234.5`
pub fn extract_number(text: &str) -> Option<f64> {
    number_re()
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

/// Currency code from a symbol or code embedded in `text`
pub fn detect_currency(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    if text.contains('€') || upper.contains("EUR") {
        Some("EUR".to_string())
    } else if text.contains('£') || upper.contains("GBP") {
        Some("GBP".to_string())
    } else if text.contains('$') || upper.contains("USD") {
        Some("USD".to_string())
    } else {
        None
    }
}

// Parsers

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => extract_number(s),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

pub fn as_count(value: &Value) -> Option<u32> {
    as_number(value).filter(|n| *n >= 0.0).map(|n| n.round() as u32)
}

pub fn as_currency(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.len() == 3 && text.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(text.to_uppercase());
    }
    detect_currency(text)
}

/// A price amount plus the currency it was quoted in, when visible
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: Option<String>,
}

pub fn as_money(value: &Value) -> Option<Money> {
    let money = match value {
        Value::Number(_) => as_number(value).map(|amount| Money { amount, currency: None }),
        Value::String(s) => extract_number(s).map(|amount| Money {
            amount,
            currency: detect_currency(s),
        }),
        Value::Object(_) => {
            let inner = ["amount", "value", "total", "price"]
                .iter()
                .find_map(|key| lookup(value, key).and_then(as_money))?;
            let currency = ["currency", "currencyCode"]
                .iter()
                .find_map(|key| lookup(value, key).and_then(as_currency))
                .or(inner.currency);
            Some(Money {
                amount: inner.amount,
                currency,
            })
        }
        _ => None,
    };
    money.filter(|money| money.amount >= 0.0)
}

pub fn as_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => ["name", "title", "facility"]
                    .iter()
                    .find_map(|key| lookup(item, key).and_then(as_text)),
                other => as_text(other),
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => return None,
    };
    Some(items).filter(|items| !items.is_empty())
}

/// Minutes become `"Xh Ym"`, text is kept as-is
pub fn as_duration(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().filter(|m| *m >= 0.0).map(|minutes| {
            let minutes = minutes.round() as u64;
            format!("{}h {}m", minutes / 60, minutes % 60)
        }),
        other => as_text(other),
    }
}

/// Stop counts from numbers or text such as "Nonstop" and "2 stops"
pub fn as_stops(value: &Value) -> Option<u32> {
    match value {
        Value::Number(_) => as_count(value),
        Value::String(s) => {
            let text = s.trim().to_lowercase();
            if text == "nonstop" || text == "non-stop" || text == "direct" {
                Some(0)
            } else {
                text.split_whitespace().next().and_then(|s| s.parse().ok())
            }
        }
        Value::Array(stops) => Some(stops.len() as u32),
        _ => None,
    }
}

pub fn stops_text(stops: Option<u32>) -> String {
    match stops {
        Some(0) => "Nonstop".to_string(),
        Some(1) => "1 stop".to_string(),
        Some(n) => format!("{} stops", n),
        None => "Unknown".to_string(),
    }
}

/// One row of a rating table: ratings at or above `min` get `label`
#[derive(Debug, Clone, PartialEq)]
pub struct RatingBand {
    pub min: f64,
    pub label: String,
}

/// Rating-to-text table for one provider scale
#[derive(Debug, Clone, PartialEq)]
pub struct RatingScale {
    pub max: f64,
    /// Ordered from the highest threshold down
    pub bands: Vec<RatingBand>,
    /// Any positive rating below every band
    pub floor_label: String,
    pub unrated_label: String,
}

impl RatingScale {
    pub fn new(max: f64, bands: &[(f64, &str)]) -> Self {
        Self {
            max,
            bands: bands
                .iter()
                .map(|(min, label)| RatingBand {
                    min: *min,
                    label: label.to_string(),
                })
                .collect(),
            floor_label: "Fair".to_string(),
            unrated_label: "No rating".to_string(),
        }
    }

    /// Review scores out of 10
    pub fn ten_point() -> Self {
        Self::new(
            10.0,
            &[(9.0, "Excellent"), (8.0, "Very Good"), (7.0, "Good"), (6.0, "Average")],
        )
    }

    /// Star ratings out of 5
    pub fn five_star() -> Self {
        Self::new(
            5.0,
            &[(4.5, "Excellent"), (4.0, "Very Good"), (3.5, "Good"), (3.0, "Average")],
        )
    }

    pub fn clamp(&self, rating: f64) -> f64 {
        if rating.is_finite() {
            rating.clamp(0.0, self.max)
        } else {
            0.0
        }
    }

    pub fn text_for(&self, rating: f64) -> String {
        match self.bands.iter().find(|band| rating >= band.min) {
            Some(band) => band.label.clone(),
            None if rating > 0.0 => self.floor_label.clone(),
            None => self.unrated_label.clone(),
        }
    }
}

// Hotel field chains

pub const HOTEL_ID: FieldChain<String> = FieldChain {
    field: "id",
    candidates: &[("id", as_text), ("hotelId", as_text), ("hotel_id", as_text)],
};

pub const HOTEL_NAME: FieldChain<String> = FieldChain {
    field: "name",
    candidates: &[("name", as_text), ("hotelName", as_text), ("title", as_text)],
};

pub const HOTEL_PRICE: FieldChain<Money> = FieldChain {
    field: "price",
    candidates: &[
        ("price", as_money),
        ("pricePerNight", as_money),
        ("priceText", as_money),
        ("displayPrice", as_money),
        ("rooms.0.price", as_money),
    ],
};

pub const CURRENCY: FieldChain<String> = FieldChain {
    field: "currency",
    candidates: &[("currency", as_currency), ("currencyCode", as_currency)],
};

pub const HOTEL_RATING: FieldChain<f64> = FieldChain {
    field: "rating",
    candidates: &[
        ("rating", as_number),
        ("guestRating", as_number),
        ("reviewScore", as_number),
        ("score", as_number),
        ("rating.value", as_number),
    ],
};

pub const HOTEL_REVIEWS: FieldChain<u32> = FieldChain {
    field: "reviewCount",
    candidates: &[
        ("reviews", as_count),
        ("reviewsCount", as_count),
        ("reviewCount", as_count),
        ("numberOfReviews", as_count),
    ],
};

pub const HOTEL_STARS: FieldChain<u32> = FieldChain {
    field: "stars",
    candidates: &[("stars", as_count), ("starRating", as_count), ("hotelClass", as_count)],
};

pub const HOTEL_ADDRESS: FieldChain<String> = FieldChain {
    field: "address",
    candidates: &[
        ("address", as_text),
        ("address.full", as_text),
        ("address.street", as_text),
        ("location.address", as_text),
        ("location", as_text),
    ],
};

pub const HOTEL_CITY: FieldChain<String> = FieldChain {
    field: "city",
    candidates: &[("city", as_text), ("address.city", as_text), ("location.city", as_text)],
};

pub const LATITUDE: FieldChain<f64> = FieldChain {
    field: "latitude",
    candidates: &[
        ("location.lat", as_number),
        ("latitude", as_number),
        ("coordinates.lat", as_number),
        ("location.latitude", as_number),
    ],
};

pub const LONGITUDE: FieldChain<f64> = FieldChain {
    field: "longitude",
    candidates: &[
        ("location.lng", as_number),
        ("longitude", as_number),
        ("coordinates.lng", as_number),
        ("location.longitude", as_number),
    ],
};

pub const HOTEL_AMENITIES: FieldChain<Vec<String>> = FieldChain {
    field: "amenities",
    candidates: &[("amenities", as_list), ("facilities", as_list), ("features", as_list)],
};

pub const HOTEL_IMAGE: FieldChain<String> = FieldChain {
    field: "imageUrl",
    candidates: &[
        ("image", as_text),
        ("thumbnail", as_text),
        ("mainImage", as_text),
        ("images.0", as_text),
        ("images.0.url", as_text),
        ("photos.0", as_text),
    ],
};

pub const BOOKING_URL: FieldChain<String> = FieldChain {
    field: "bookingUrl",
    candidates: &[("url", as_text), ("bookingUrl", as_text), ("link", as_text), ("deeplink", as_text)],
};

// Flight field chains

pub const FLIGHT_ID: FieldChain<String> = FieldChain {
    field: "id",
    candidates: &[("id", as_text), ("flightId", as_text)],
};

pub const FLIGHT_AIRLINE: FieldChain<String> = FieldChain {
    field: "airline",
    candidates: &[
        ("airline", as_text),
        ("airlineName", as_text),
        ("carrier", as_text),
        ("airlines.0", as_text),
        ("legs.0.carriers.0.name", as_text),
        ("name", as_text),
    ],
};

pub const FLIGHT_NUMBER: FieldChain<String> = FieldChain {
    field: "flightNumber",
    candidates: &[
        ("flightNumber", as_text),
        ("flight_number", as_text),
        ("legs.0.flightNumber", as_text),
    ],
};

pub const FLIGHT_ORIGIN: FieldChain<String> = FieldChain {
    field: "origin",
    candidates: &[
        ("origin", as_text),
        ("from", as_text),
        ("departureAirport", as_text),
        ("legs.0.origin.id", as_text),
    ],
};

pub const FLIGHT_DESTINATION: FieldChain<String> = FieldChain {
    field: "destination",
    candidates: &[
        ("destination", as_text),
        ("to", as_text),
        ("arrivalAirport", as_text),
        ("legs.0.destination.id", as_text),
    ],
};

pub const FLIGHT_DEPARTURE: FieldChain<String> = FieldChain {
    field: "departureTime",
    candidates: &[
        ("departureTime", as_text),
        ("departure", as_text),
        ("departure_time", as_text),
        ("legs.0.departure", as_text),
    ],
};

pub const FLIGHT_ARRIVAL: FieldChain<String> = FieldChain {
    field: "arrivalTime",
    candidates: &[
        ("arrivalTime", as_text),
        ("arrival", as_text),
        ("arrival_time", as_text),
        ("legs.0.arrival", as_text),
    ],
};

pub const FLIGHT_DURATION: FieldChain<String> = FieldChain {
    field: "duration",
    candidates: &[
        ("duration", as_duration),
        ("totalDuration", as_duration),
        ("durationInMinutes", as_duration),
        ("legs.0.durationInMinutes", as_duration),
    ],
};

pub const FLIGHT_STOPS: FieldChain<u32> = FieldChain {
    field: "stops",
    candidates: &[
        ("stops", as_stops),
        ("stopCount", as_stops),
        ("numberOfStops", as_stops),
        ("legs.0.stopCount", as_stops),
    ],
};

pub const FLIGHT_PRICE: FieldChain<Money> = FieldChain {
    field: "price",
    candidates: &[
        ("price", as_money),
        ("pricing.total", as_money),
        ("priceText", as_money),
        ("minPrice", as_money),
    ],
};

/// Maps raw records of one source into normalized results
pub struct ResultNormalizer<'a> {
    source: &'a SourceConfig,
}

impl<'a> ResultNormalizer<'a> {
    pub fn new(source: &'a SourceConfig) -> Self {
        Self { source }
    }

    /// Resolve price and currency. An explicit currency field beats a symbol
    /// in the price text; missing prices use the configured default.
    fn price(&self, chain: &FieldChain<Money>, record: &Value, multiplier: u32) -> Price {
        let money = chain.resolve(record);
        let currency = CURRENCY
            .resolve(record)
            .or_else(|| money.as_ref().and_then(|m| m.currency.clone()))
            .unwrap_or_else(|| self.source.default_currency.clone());
        let amount = money.map(|m| m.amount).unwrap_or(self.source.default_price);
        Price::new(amount, &currency, multiplier)
    }

    /// Normalize one hotel record; `None` when it has no name
    pub fn hotel(&self, record: &RawRecord, index: usize, search: &HotelSearch) -> Option<HotelResult> {
        if !record.is_object() {
            debug!(index, "Dropping non-object hotel record");
            return None;
        }
        let Some(name) = HOTEL_NAME.resolve(record) else {
            debug!(index, field = HOTEL_NAME.field, "Dropping hotel record without name");
            return None;
        };

        let (rating, rating_text) = self.source.rate(HOTEL_RATING.resolve(record).unwrap_or(0.0));

        Some(HotelResult {
            id: HOTEL_ID
                .resolve(record)
                .unwrap_or_else(|| format!("hotel-{}", index + 1)),
            price: self.price(&HOTEL_PRICE, record, search.nights),
            rating,
            rating_text,
            review_count: HOTEL_REVIEWS.resolve(record).unwrap_or(0),
            stars: HOTEL_STARS.resolve(record).unwrap_or(0).min(5),
            location: Location {
                address: HOTEL_ADDRESS.resolve(record).unwrap_or_default(),
                city: HOTEL_CITY
                    .resolve(record)
                    .unwrap_or_else(|| search.destination.clone()),
                latitude: LATITUDE.resolve(record),
                longitude: LONGITUDE.resolve(record),
            },
            amenities: HOTEL_AMENITIES.resolve(record).unwrap_or_default(),
            image_url: HOTEL_IMAGE.resolve(record).unwrap_or_default(),
            booking_url: BOOKING_URL
                .resolve(record)
                .unwrap_or_else(|| deeplink::hotel_search_url(search, Some(&name))),
            check_in: search.check_in.to_string(),
            check_out: search.check_out.to_string(),
            nights: search.nights,
            guests: search.guests,
            rooms: search.rooms,
            name,
        })
    }

    /// Normalize a dataset, keeping provider order and capping at `max_results`
    pub fn hotels(&self, records: &[RawRecord], search: &HotelSearch) -> Vec<HotelResult> {
        let mut results: Vec<HotelResult> = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| self.hotel(record, i, search))
            .collect();
        debug!(
            raw = records.len(),
            normalized = results.len(),
            "Normalized hotel records"
        );
        results.truncate(self.source.max_results);
        results
    }

    /// Normalize one flight record; `None` when it has no airline
    pub fn flight(&self, record: &RawRecord, index: usize, search: &FlightSearch) -> Option<FlightResult> {
        if !record.is_object() {
            debug!(index, "Dropping non-object flight record");
            return None;
        }
        let Some(airline) = FLIGHT_AIRLINE.resolve(record) else {
            debug!(index, field = FLIGHT_AIRLINE.field, "Dropping flight record without airline");
            return None;
        };
        let stops = FLIGHT_STOPS.resolve(record);

        Some(FlightResult {
            id: FLIGHT_ID
                .resolve(record)
                .unwrap_or_else(|| format!("flight-{}", index + 1)),
            flight_number: FLIGHT_NUMBER.resolve(record).unwrap_or_default(),
            origin: FLIGHT_ORIGIN.resolve(record).unwrap_or_else(|| search.from.clone()),
            destination: FLIGHT_DESTINATION
                .resolve(record)
                .unwrap_or_else(|| search.to.clone()),
            departure_time: FLIGHT_DEPARTURE
                .resolve(record)
                .unwrap_or_else(|| "Unknown".to_string()),
            arrival_time: FLIGHT_ARRIVAL
                .resolve(record)
                .unwrap_or_else(|| "Unknown".to_string()),
            duration: FLIGHT_DURATION
                .resolve(record)
                .unwrap_or_else(|| "Unknown".to_string()),
            stops: stops.unwrap_or(0),
            stops_text: stops_text(stops),
            price: self.price(&FLIGHT_PRICE, record, search.passengers),
            booking_url: BOOKING_URL
                .resolve(record)
                .unwrap_or_else(|| deeplink::google_flights_url(search)),
            depart_date: search.depart.to_string(),
            return_date: search.return_date.map(|d| d.to_string()),
            passengers: search.passengers,
            airline,
        })
    }

    pub fn flights(&self, records: &[RawRecord], search: &FlightSearch) -> Vec<FlightResult> {
        let mut results: Vec<FlightResult> = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| self.flight(record, i, search))
            .collect();
        debug!(
            raw = records.len(),
            normalized = results.len(),
            "Normalized flight records"
        );
        results.truncate(self.source.max_results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::PollPolicy;
    use crate::{FlightSearchRequest, HotelSearchRequest};
    use serde_json::json;

    fn hotel_source() -> SourceConfig {
        SourceConfig::new("hotels", PollPolicy::default()).with_rating_scale(RatingScale::ten_point())
    }

    fn flight_source() -> SourceConfig {
        SourceConfig::new("flights", PollPolicy::default())
    }

    fn three_nights() -> HotelSearch {
        HotelSearchRequest::new("Paris", "2025-05-01", "2025-05-04")
            .validate()
            .unwrap()
    }

    fn one_way() -> FlightSearch {
        let mut request = FlightSearchRequest::new("LAX", "JFK", "2025-08-15");
        request.passengers = 2;
        request.validate().unwrap()
    }

    #[test]
    fn test_hotel_x_scenario() {
        let source = hotel_source();
        let record = json!({ "name": "Hotel X", "price": "€120", "guestRating": 8.7 });
        let hotel = ResultNormalizer::new(&source)
            .hotel(&record, 0, &three_nights())
            .unwrap();

        assert_eq!(hotel.name, "Hotel X");
        assert_eq!(hotel.price.amount, 120.0);
        assert_eq!(hotel.price.currency, "EUR");
        assert_eq!(hotel.price.total, 360.0);
        assert_eq!(hotel.price.total_formatted, "€360");
        assert_eq!(hotel.rating, 8.7);
        assert_eq!(hotel.rating_text, "Very Good");
        assert_eq!(hotel.nights, 3);
        assert_eq!(hotel.location.city, "Paris");
    }

    #[test]
    fn test_explicit_currency_beats_price_symbol() {
        let source = hotel_source();
        let normalizer = ResultNormalizer::new(&source);

        let record = json!({ "name": "H", "price": "€120", "currency": "USD" });
        let hotel = normalizer.hotel(&record, 0, &three_nights()).unwrap();
        assert_eq!(hotel.price.currency, "USD");
        assert_eq!(hotel.price.formatted, "$120");

        // Same answer when the price arrives as an object
        let record = json!({ "name": "H", "price": { "amount": "€120" }, "currencyCode": "usd" });
        let hotel = normalizer.hotel(&record, 0, &three_nights()).unwrap();
        assert_eq!(hotel.price.currency, "USD");
    }

    #[test]
    fn test_star_scale_source() {
        let source = SourceConfig::new("hotels", PollPolicy::default()).with_rating_scale(RatingScale::five_star());
        let hotel = ResultNormalizer::new(&source)
            .hotel(&json!({ "name": "Starry", "rating": 4.2 }), 0, &three_nights())
            .unwrap();
        assert_eq!(hotel.rating, 4.2);
        assert_eq!(hotel.rating_text, "Very Good");

        let hotel = ResultNormalizer::new(&source)
            .hotel(&json!({ "name": "Overflow", "rating": 8.7 }), 0, &three_nights())
            .unwrap();
        assert_eq!(hotel.rating, 5.0);
        assert_eq!(hotel.rating_text, "Excellent");
    }

    #[test]
    fn test_record_without_name_is_dropped() {
        let source = hotel_source();
        let records = vec![
            json!({ "price": 99, "rating": 9.1 }),
            json!("not an object"),
            json!(null),
            json!({ "title": "Kept Hotel" }),
        ];
        let hotels = ResultNormalizer::new(&source).hotels(&records, &three_nights());
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0].name, "Kept Hotel");
        // Index-based ids follow the provider position
        assert_eq!(hotels[0].id, "hotel-4");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let mut source = hotel_source();
        source.default_price = 75.0;
        source.default_currency = "EUR".to_string();
        let hotel = ResultNormalizer::new(&source)
            .hotel(&json!({ "name": "Bare" }), 0, &three_nights())
            .unwrap();

        assert_eq!(hotel.price.amount, 75.0);
        assert_eq!(hotel.price.currency, "EUR");
        assert_eq!(hotel.price.total, 225.0);
        assert_eq!(hotel.rating, 0.0);
        assert_eq!(hotel.rating_text, "No rating");
        assert_eq!(hotel.location.address, "");
        assert!(hotel.amenities.is_empty());
        assert!(hotel.booking_url.starts_with("https://www.booking.com/searchresults.html"));
    }

    #[test]
    fn test_field_chain_order() {
        let source = hotel_source();
        let record = json!({
            "hotelName": "Second Choice",
            "title": "Third Choice",
            "pricePerNight": { "value": "1,250.50", "currency": "gbp" },
            "reviewScore": "Superb 9.4",
            "address": { "full": "1 Main St", "city": "Bath" },
            "facilities": [{ "name": "Free WiFi" }, "Pool", { "other": 1 }],
            "images": [{ "url": "https://img/1.jpg" }],
            "location": { "lat": 51.38, "lng": -2.36 },
            "stars": "4 stars",
            "reviews": "1,024 reviews"
        });
        let hotel = ResultNormalizer::new(&source)
            .hotel(&record, 0, &three_nights())
            .unwrap();

        assert_eq!(hotel.name, "Second Choice");
        assert_eq!(hotel.price.amount, 1250.5);
        assert_eq!(hotel.price.currency, "GBP");
        assert_eq!(hotel.rating, 9.4);
        assert_eq!(hotel.rating_text, "Excellent");
        assert_eq!(hotel.location.address, "1 Main St");
        assert_eq!(hotel.location.city, "Bath");
        assert_eq!(hotel.location.latitude, Some(51.38));
        assert_eq!(hotel.amenities, vec!["Free WiFi", "Pool"]);
        assert_eq!(hotel.image_url, "https://img/1.jpg");
        assert_eq!(hotel.stars, 4);
        assert_eq!(hotel.review_count, 1024);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let source = hotel_source();
        let records = vec![
            json!({ "name": "A" }),
            json!({ "name": "B", "price": "n/a" }),
            json!({ "name": "C", "price": 80, "currency": "EUR" }),
        ];
        let normalizer = ResultNormalizer::new(&source);
        let first = normalizer.hotels(&records, &three_nights());
        let second = normalizer.hotels(&records, &three_nights());
        assert_eq!(first, second);
        assert_eq!(first[1].price.amount, 0.0);
        assert_eq!(first[2].price.currency, "EUR");
    }

    #[test]
    fn test_truncation_keeps_provider_order() {
        let mut source = hotel_source();
        source.max_results = 2;
        let records: Vec<Value> = (1..=5)
            .map(|i| json!({ "name": format!("Hotel {}", i), "rating": 10 - i }))
            .collect();
        let hotels = ResultNormalizer::new(&source).hotels(&records, &three_nights());
        let names: Vec<_> = hotels.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Hotel 1", "Hotel 2"]);
    }

    #[test]
    fn test_rating_tables() {
        let ten = RatingScale::ten_point();
        assert_eq!(ten.text_for(9.0), "Excellent");
        assert_eq!(ten.text_for(8.7), "Very Good");
        assert_eq!(ten.text_for(7.0), "Good");
        assert_eq!(ten.text_for(6.5), "Average");
        assert_eq!(ten.text_for(2.0), "Fair");
        assert_eq!(ten.text_for(0.0), "No rating");
        assert_eq!(ten.clamp(14.0), 10.0);
        assert_eq!(ten.clamp(-1.0), 0.0);

        let five = RatingScale::five_star();
        assert_eq!(five.text_for(4.6), "Excellent");
        assert_eq!(five.text_for(4.0), "Very Good");
        assert_eq!(five.text_for(3.2), "Average");
        assert_eq!(five.text_for(1.0), "Fair");
    }

    #[test]
    fn test_number_and_currency_extraction() {
        assert_eq!(extract_number("€120"), Some(120.0));
        assert_eq!(extract_number("US$1,234.56 total"), Some(1234.56));
        assert_eq!(extract_number("from 89.9 per night"), Some(89.9));
        assert_eq!(extract_number("sold out"), None);
        assert_eq!(detect_currency("£45"), Some("GBP".to_string()));
        assert_eq!(detect_currency("45 EUR"), Some("EUR".to_string()));
        assert_eq!(detect_currency("45"), None);
    }

    #[test]
    fn test_lookup_paths() {
        let record = json!({ "a": { "b": [10, { "c": "deep" }] }, "n": null });
        assert_eq!(lookup(&record, "a.b.0"), Some(&json!(10)));
        assert_eq!(lookup(&record, "a.b.1.c"), Some(&json!("deep")));
        assert_eq!(lookup(&record, "a.b.9"), None);
        assert_eq!(lookup(&record, "n"), None);
        assert_eq!(lookup(&record, "missing.path"), None);
    }

    #[test]
    fn test_flight_normalization() {
        let source = flight_source();
        let record = json!({
            "airlineName": "Delta",
            "flightNumber": "DL 420",
            "departureTime": "8:05 AM",
            "arrivalTime": "4:31 PM",
            "durationInMinutes": 326,
            "stops": "Nonstop",
            "price": "$289"
        });
        let flight = ResultNormalizer::new(&source)
            .flight(&record, 0, &one_way())
            .unwrap();

        assert_eq!(flight.airline, "Delta");
        assert_eq!(flight.flight_number, "DL 420");
        assert_eq!(flight.origin, "LAX");
        assert_eq!(flight.destination, "JFK");
        assert_eq!(flight.duration, "5h 26m");
        assert_eq!(flight.stops, 0);
        assert_eq!(flight.stops_text, "Nonstop");
        assert_eq!(flight.price.amount, 289.0);
        assert_eq!(flight.price.currency, "USD");
        assert_eq!(flight.price.total, 578.0);
        assert!(flight.booking_url.starts_with("https://www.google.com/travel/flights?tfs="));
    }

    #[test]
    fn test_flight_stops_and_defaults() {
        let source = flight_source();
        let normalizer = ResultNormalizer::new(&source);
        let search = one_way();

        let flight = normalizer
            .flight(&json!({ "carrier": "United", "stops": "2 stops" }), 0, &search)
            .unwrap();
        assert_eq!(flight.stops, 2);
        assert_eq!(flight.stops_text, "2 stops");
        assert_eq!(flight.departure_time, "Unknown");
        assert_eq!(flight.price.amount, 0.0);

        let flight = normalizer
            .flight(&json!({ "carrier": "United", "stops": "a few" }), 1, &search)
            .unwrap();
        assert_eq!(flight.stops, 0);
        assert_eq!(flight.stops_text, "Unknown");
        assert_eq!(flight.id, "flight-2");

        assert!(normalizer.flight(&json!({ "price": 100 }), 2, &search).is_none());
    }
}
