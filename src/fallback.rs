//! Synthetic results for when the live provider cannot deliver
//!
//! Entries are deterministic, derived only from the request, and carry every
//! field a provider-sourced result carries. Names are tagged `(sample)` so
//! nobody mistakes them for live inventory.

use crate::config::SourceConfig;
use crate::deeplink;
use crate::normalize::stops_text;
use crate::{FlightResult, FlightSearch, HotelResult, HotelSearch, Location, Price};

struct HotelTemplate {
    name: &'static str,
    price: f64,
    rating: f64,
    review_count: u32,
    stars: u32,
    district: &'static str,
    amenities: &'static [&'static str],
}

const HOTEL_TEMPLATES: [HotelTemplate; 3] = [
    HotelTemplate {
        name: "Grand Central Hotel",
        price: 189.0,
        rating: 8.9,
        review_count: 1248,
        stars: 4,
        district: "City Centre",
        amenities: &["Free WiFi", "Restaurant", "Fitness centre", "24-hour front desk"],
    },
    HotelTemplate {
        name: "Riverside Boutique Inn",
        price: 132.0,
        rating: 8.2,
        review_count: 563,
        stars: 3,
        district: "Old Town",
        amenities: &["Free WiFi", "Breakfast included", "Bar"],
    },
    HotelTemplate {
        name: "Skyline Suites",
        price: 245.0,
        rating: 9.3,
        review_count: 2087,
        stars: 5,
        district: "Business District",
        amenities: &["Free WiFi", "Spa", "Pool", "Airport shuttle", "Room service"],
    },
];

struct FlightTemplate {
    airline: &'static str,
    code: &'static str,
    number: u32,
    departure: &'static str,
    arrival: &'static str,
    duration: &'static str,
    stops: u32,
    price: f64,
}

const FLIGHT_TEMPLATES: [FlightTemplate; 3] = [
    FlightTemplate {
        airline: "SkyWays",
        code: "SW",
        number: 101,
        departure: "07:15",
        arrival: "10:40",
        duration: "3h 25m",
        stops: 0,
        price: 249.0,
    },
    FlightTemplate {
        airline: "Coastal Air",
        code: "CA",
        number: 482,
        departure: "12:05",
        arrival: "17:20",
        duration: "5h 15m",
        stops: 1,
        price: 189.0,
    },
    FlightTemplate {
        airline: "Northern Jet",
        code: "NJ",
        number: 736,
        departure: "18:30",
        arrival: "21:55",
        duration: "3h 25m",
        stops: 0,
        price: 312.0,
    },
];

/// Builds fallback result sets for one source
pub struct FallbackProvider<'a> {
    source: &'a SourceConfig,
}

impl<'a> FallbackProvider<'a> {
    pub fn new(source: &'a SourceConfig) -> Self {
        Self { source }
    }

    pub fn hotels(&self, search: &HotelSearch) -> Vec<HotelResult> {
        let currency = &self.source.default_currency;
        HOTEL_TEMPLATES
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let name = format!("{} {} (sample)", search.destination, template.name);
                let (rating, rating_text) = self.source.rate(template.rating);
                HotelResult {
                    id: format!("fallback-hotel-{}", i + 1),
                    price: Price::new(template.price, currency, search.nights),
                    rating,
                    rating_text,
                    review_count: template.review_count,
                    stars: template.stars,
                    location: Location {
                        address: format!("{}, {}", template.district, search.destination),
                        city: search.destination.clone(),
                        latitude: None,
                        longitude: None,
                    },
                    amenities: template.amenities.iter().map(|a| a.to_string()).collect(),
                    image_url: String::new(),
                    booking_url: deeplink::hotel_search_url(search, None),
                    check_in: search.check_in.to_string(),
                    check_out: search.check_out.to_string(),
                    nights: search.nights,
                    guests: search.guests,
                    rooms: search.rooms,
                    name,
                }
            })
            .collect()
    }

    pub fn flights(&self, search: &FlightSearch) -> Vec<FlightResult> {
        let currency = &self.source.default_currency;
        let booking_url = deeplink::google_flights_url(search);
        FLIGHT_TEMPLATES
            .iter()
            .enumerate()
            .map(|(i, template)| FlightResult {
                id: format!("fallback-flight-{}", i + 1),
                airline: format!("{} (sample)", template.airline),
                flight_number: format!("{}{}", template.code, template.number),
                origin: search.from.clone(),
                destination: search.to.clone(),
                departure_time: template.departure.to_string(),
                arrival_time: template.arrival.to_string(),
                duration: template.duration.to_string(),
                stops: template.stops,
                stops_text: stops_text(Some(template.stops)),
                price: Price::new(template.price, currency, search.passengers),
                booking_url: booking_url.clone(),
                depart_date: search.depart.to_string(),
                return_date: search.return_date.map(|d| d.to_string()),
                passengers: search.passengers,
            })
            .collect()
    }
}
