//! Booking deep links for results that arrive without their own URL
//!
//! Flights link to Google Flights, whose `tfs` query parameter is a
//! URL-safe base64 protobuf describing the search. Hotels link to a
//! Booking.com search for the requested stay.

use crate::{FlightSearch, HotelSearch, SeatClass, TripType};
use base64::{engine::general_purpose, Engine as _};
use prost::Message;
use reqwest::Url;
use tracing::warn;

const GOOGLE_FLIGHTS_URL: &str = "https://www.google.com/travel/flights";
const BOOKING_SEARCH_URL: &str = "https://www.booking.com/searchresults.html";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Airport {
    #[prost(string, tag = "2")]
    pub airport: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FlightLeg {
    #[prost(string, tag = "2")]
    pub date: String,
    #[prost(int32, optional, tag = "5")]
    pub max_stops: Option<i32>,
    #[prost(string, repeated, tag = "6")]
    pub airlines: Vec<String>,
    #[prost(message, optional, tag = "13")]
    pub from_flight: Option<Airport>,
    #[prost(message, optional, tag = "14")]
    pub to_flight: Option<Airport>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Seat {
    UnknownSeat = 0,
    Economy = 1,
    PremiumEconomy = 2,
    Business = 3,
    First = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Trip {
    UnknownTrip = 0,
    RoundTrip = 1,
    OneWay = 2,
    MultiCity = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Passenger {
    UnknownPassenger = 0,
    Adult = 1,
    Child = 2,
    InfantInSeat = 3,
    InfantOnLap = 4,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Info {
    #[prost(message, repeated, tag = "3")]
    pub data: Vec<FlightLeg>,
    #[prost(enumeration = "Passenger", repeated, tag = "8")]
    pub passengers: Vec<i32>,
    #[prost(enumeration = "Seat", tag = "9")]
    pub seat: i32,
    #[prost(enumeration = "Trip", tag = "19")]
    pub trip: i32,
}

impl From<SeatClass> for Seat {
    fn from(seat_class: SeatClass) -> Self {
        match seat_class {
            SeatClass::Economy => Seat::Economy,
            SeatClass::PremiumEconomy => Seat::PremiumEconomy,
            SeatClass::Business => Seat::Business,
            SeatClass::First => Seat::First,
        }
    }
}

impl From<TripType> for Trip {
    fn from(trip_type: TripType) -> Self {
        match trip_type {
            TripType::RoundTrip => Trip::RoundTrip,
            TripType::OneWay => Trip::OneWay,
        }
    }
}

fn leg(date: String, from: &str, to: &str) -> FlightLeg {
    FlightLeg {
        date,
        max_stops: None,
        airlines: vec![],
        from_flight: Some(Airport {
            airport: from.to_string(),
        }),
        to_flight: Some(Airport {
            airport: to.to_string(),
        }),
    }
}

/// Build the protobuf search message for a validated flight search
pub fn build_flight_info(search: &FlightSearch) -> Info {
    let mut data = vec![leg(search.depart.to_string(), &search.from, &search.to)];
    if let Some(return_date) = search.return_date {
        data.push(leg(return_date.to_string(), &search.to, &search.from));
    }

    Info {
        data,
        passengers: vec![Passenger::Adult as i32; search.passengers as usize],
        seat: Seat::from(search.seat_class) as i32,
        trip: Trip::from(search.trip_type) as i32,
    }
}

/// Encode protobuf message to base64 for URL parameter
pub fn encode_to_base64(info: &Info) -> String {
    general_purpose::URL_SAFE.encode(info.encode_to_vec())
}

/// Google Flights link for the searched route and dates
pub fn google_flights_url(search: &FlightSearch) -> String {
    let encoded = encode_to_base64(&build_flight_info(search));
    format!("{}?tfs={}", GOOGLE_FLIGHTS_URL, encoded)
}

/// Booking.com search link for the requested stay, optionally narrowed to
/// one property name
pub fn hotel_search_url(search: &HotelSearch, hotel_name: Option<&str>) -> String {
    let query = match hotel_name {
        Some(name) => format!("{} {}", name, search.destination),
        None => search.destination.clone(),
    };
    let params = [
        ("ss", query),
        ("checkin", search.check_in.to_string()),
        ("checkout", search.check_out.to_string()),
        ("group_adults", search.guests.to_string()),
        ("no_rooms", search.rooms.to_string()),
    ];
    match Url::parse_with_params(BOOKING_SEARCH_URL, &params) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!(error = %e, "Failed to build hotel search URL");
            BOOKING_SEARCH_URL.to_string()
        }
    }
}
