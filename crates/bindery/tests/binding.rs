//! Integration tests for struct binding.
//!
//! These tests drive `#[derive(Bind)]` destinations through every pass of
//! the orchestrator, from a request built the way a server adapter would.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

use bindery::{
    bind_all, bind_body, bind_headers, bind_path, bind_query, field_hooks, populate, Bind,
    BindError, BindRequest, Binder, BinderConfig, BoxError, DecodeParam, DecodeParams, FromText,
    SourceMap, Tag,
};
use http::{Method, StatusCode, Uri};

#[derive(Bind, Debug, Default)]
struct Lookup {
    #[bind(param = "id", query = "id", json = "id", xml = "id", form = "id")]
    id: i64,
}

#[derive(Bind, Debug, Default)]
struct Listing {
    #[bind(query = "page")]
    page: u32,
    #[bind(query = "ids")]
    ids: Vec<u32>,
    #[bind(query = "active")]
    active: bool,
    #[bind(query = "ratio")]
    ratio: Option<f64>,
    #[bind(header = "X-Request-Id")]
    request_id: String,
}

#[derive(Bind, Debug, Default, PartialEq)]
struct Timestamps {
    #[bind(query = "created", json = "created")]
    created: i64,
    #[bind(query = "updated", json = "updated")]
    updated: i64,
}

#[derive(Bind, Debug, Default)]
struct Article {
    #[bind(query = "title", json = "title", xml = "title", form = "title")]
    title: String,
    #[bind(flatten)]
    timestamps: Timestamps,
    #[bind(skip)]
    cached: bool,
}

#[derive(Bind, Debug, Default, PartialEq)]
struct Location {
    #[bind(json = "cityName", xml = "city-name")]
    city: String,
    #[bind(json = "zipCode", xml = "zip-code")]
    zip: u32,
}

#[derive(Bind, Debug, Default)]
struct Shipment {
    #[bind(json = "inner", xml = "inner")]
    inner: Location,
    #[bind(json = "stops")]
    stops: Vec<Location>,
    #[bind(json = "backup")]
    backup: Option<Location>,
}

/// A comma-separated list that decodes itself.
#[derive(Debug, Default, PartialEq)]
struct Csv(Vec<String>);

impl DecodeParams for Csv {
    fn decode_params(&mut self, raw: &[String]) -> Result<(), BoxError> {
        self.0 = raw
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::to_owned)
            .collect();
        Ok(())
    }
}

field_hooks!(Csv => params);

/// Coordinates written as `lat:lng`, bound as one field.
#[derive(Bind, Debug, Default, PartialEq)]
#[bind(hooks(param))]
struct Coordinates {
    #[bind(query = "lat")]
    lat: f64,
    #[bind(query = "lng")]
    lng: f64,
}

impl DecodeParam for Coordinates {
    fn decode_param(&mut self, raw: &str) -> Result<(), BoxError> {
        let (lat, lng) = raw.split_once(':').ok_or("expected lat:lng")?;
        self.lat = lat.parse()?;
        self.lng = lng.parse()?;
        Ok(())
    }
}

#[derive(Bind, Debug)]
struct Search {
    #[bind(query = "tags", json = "-", xml = "-")]
    tags: Csv,
    #[bind(query = "at", json = "-", xml = "-")]
    at: Coordinates,
    #[bind(json = "-", xml = "-")]
    origin: Coordinates,
    #[bind(query = "addr", xml = "-")]
    addr: FromText<Ipv4Addr>,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            tags: Csv::default(),
            at: Coordinates::default(),
            origin: Coordinates::default(),
            addr: FromText(Ipv4Addr::UNSPECIFIED),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bindery=trace")
        .with_test_writer()
        .try_init();
}

fn get(uri: &'static str) -> BindRequest {
    BindRequest::builder().uri(Uri::from_static(uri)).build()
}

fn post(content_type: &str, body: &'static str) -> BindRequest {
    BindRequest::builder()
        .method(Method::POST)
        .uri(Uri::from_static("/items"))
        .header("content-type", content_type)
        .body(body)
        .build()
}

#[test]
fn test_query_binds_scalar() {
    let mut lookup = Lookup::default();
    bind_query(&mut lookup, &get("/items?id=7")).unwrap();
    assert_eq!(lookup.id, 7);
}

#[test]
fn test_later_sources_win() {
    let request = BindRequest::builder()
        .method(Method::PUT)
        .uri(Uri::from_static("/items/1?id=2"))
        .header("content-type", "application/json")
        .body(r#"{"id": 3}"#)
        .path_param("id", "1")
        .build();

    let mut lookup = Lookup::default();
    bind_all(&mut lookup, &request).unwrap();
    assert_eq!(lookup.id, 3);
}

#[test]
fn test_absent_body_key_keeps_earlier_value() {
    let request = BindRequest::builder()
        .method(Method::PUT)
        .uri(Uri::from_static("/items/1?id=2"))
        .header("content-type", "application/json")
        .body(r#"{"other": true}"#)
        .path_param("id", "1")
        .build();

    let mut lookup = Lookup::default();
    bind_all(&mut lookup, &request).unwrap();
    assert_eq!(lookup.id, 2);
}

#[test]
fn test_path_pass_only_reads_param_tag() {
    let request = BindRequest::builder()
        .uri(Uri::from_static("/items?page=4"))
        .path_param("page", "9")
        .build();

    let mut listing = Listing::default();
    bind_path(&mut listing, &request).unwrap();
    assert_eq!(listing.page, 0);
}

#[test]
fn test_empty_value_resets_to_zero() {
    let mut listing = Listing {
        page: 5,
        active: true,
        ..Listing::default()
    };
    bind_query(&mut listing, &get("/items?page=&active=")).unwrap();
    assert_eq!(listing.page, 0);
    assert!(!listing.active);
}

#[test]
fn test_repeated_keys_fill_sequence() {
    let mut listing = Listing::default();
    bind_query(&mut listing, &get("/items?ids=1&ids=2&ids=3")).unwrap();
    assert_eq!(listing.ids, vec![1, 2, 3]);
}

#[test]
fn test_failed_sequence_element_leaves_sequence_untouched() {
    let mut listing = Listing {
        ids: vec![9],
        ..Listing::default()
    };
    let err = bind_query(&mut listing, &get("/items?ids=1&ids=x")).unwrap_err();
    assert!(matches!(err, BindError::ConversionFailure { .. }));
    assert_eq!(listing.ids, vec![9]);
}

#[test]
fn test_pass_stops_at_first_error() {
    let mut listing = Listing::default();
    let err = bind_query(&mut listing, &get("/items?page=2&active=maybe&ratio=0.5")).unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(listing.page, 2);
    assert_eq!(listing.ratio, None);
}

#[test]
fn test_pointer_is_allocated_on_demand() {
    let mut listing = Listing::default();
    bind_query(&mut listing, &get("/items?ratio=0.25")).unwrap();
    assert_eq!(listing.ratio, Some(0.25));
}

#[test]
fn test_header_matches_case_insensitively() {
    init_tracing();
    let request = BindRequest::builder()
        .header("x-request-id", "req-42")
        .build();

    let mut listing = Listing::default();
    bind_headers(&mut listing, &request).unwrap();
    assert_eq!(listing.request_id, "req-42");
}

#[test]
fn test_bind_all_ignores_headers() {
    let request = BindRequest::builder()
        .header("x-request-id", "req-42")
        .build();

    let mut listing = Listing::default();
    bind_all(&mut listing, &request).unwrap();
    assert!(listing.request_id.is_empty());
}

#[test]
fn test_embedded_fields_are_promoted() {
    let mut article = Article::default();
    bind_query(&mut article, &get("/a?title=hello&created=10&updated=20")).unwrap();

    assert_eq!(article.title, "hello");
    assert_eq!(
        article.timestamps,
        Timestamps {
            created: 10,
            updated: 20
        }
    );
}

#[test]
fn test_json_merges_embedded_fields() {
    let mut article = Article {
        title: "draft".to_string(),
        timestamps: Timestamps {
            created: 1,
            updated: 1,
        },
        cached: true,
    };

    bind_body(&mut article, &post("application/json", r#"{"updated": 5}"#)).unwrap();

    assert_eq!(article.title, "draft");
    assert_eq!(article.timestamps.created, 1);
    assert_eq!(article.timestamps.updated, 5);
    assert!(article.cached);
}

#[test]
fn test_json_merges_nested_struct_by_its_own_keys() {
    let mut shipment = Shipment {
        inner: Location {
            city: "Bergen".to_string(),
            zip: 150,
        },
        ..Shipment::default()
    };

    bind_body(
        &mut shipment,
        &post("application/json", r#"{"inner":{"cityName":"Oslo"}}"#),
    )
    .unwrap();

    assert_eq!(shipment.inner.city, "Oslo");
    assert_eq!(shipment.inner.zip, 150);
    assert!(shipment.stops.is_empty());
    assert!(shipment.backup.is_none());
}

#[test]
fn test_json_nested_pointer_and_sequence() {
    let mut shipment = Shipment {
        backup: Some(Location {
            city: "Tromso".to_string(),
            zip: 9000,
        }),
        ..Shipment::default()
    };

    bind_body(
        &mut shipment,
        &post(
            "application/json",
            r#"{"backup":{"zipCode":9001},"stops":[{"cityName":"Bodo"},{"zipCode":7}]}"#,
        ),
    )
    .unwrap();

    assert_eq!(
        shipment.backup,
        Some(Location {
            city: "Tromso".to_string(),
            zip: 9001,
        })
    );
    assert_eq!(
        shipment.stops,
        vec![
            Location {
                city: "Bodo".to_string(),
                zip: 0,
            },
            Location {
                city: String::new(),
                zip: 7,
            },
        ]
    );
}

#[test]
fn test_json_null_keeps_nested_pointer() {
    let mut shipment = Shipment {
        backup: Some(Location::default()),
        ..Shipment::default()
    };

    bind_body(&mut shipment, &post("application/json", r#"{"backup":null}"#)).unwrap();
    assert!(shipment.backup.is_some());
}

#[test]
fn test_xml_merges_nested_struct_by_its_own_keys() {
    let mut shipment = Shipment {
        inner: Location {
            city: "Bergen".to_string(),
            zip: 150,
        },
        ..Shipment::default()
    };

    bind_body(
        &mut shipment,
        &post(
            "application/xml",
            "<shipment><inner><city-name>Oslo</city-name></inner></shipment>",
        ),
    )
    .unwrap();

    assert_eq!(shipment.inner.city, "Oslo");
    assert_eq!(shipment.inner.zip, 150);
}

#[test]
fn test_xml_body() {
    let mut article = Article::default();
    bind_body(
        &mut article,
        &post("application/xml", "<article><title>XML</title></article>"),
    )
    .unwrap();
    assert_eq!(article.title, "XML");

    let mut lookup = Lookup::default();
    bind_body(&mut lookup, &post("text/xml; charset=utf-8", "<lookup><id>12</id></lookup>")).unwrap();
    assert_eq!(lookup.id, 12);
}

#[test]
fn test_urlencoded_form_body() {
    let mut article = Article::default();
    bind_body(
        &mut article,
        &post("application/x-www-form-urlencoded", "title=from+form&created=3"),
    )
    .unwrap();

    assert_eq!(article.title, "from form");
    assert_eq!(article.timestamps.created, 0);
}

#[test]
fn test_multipart_form_body() {
    let body = "--BOUNDARY\r\n\
                Content-Disposition: form-data; name=\"id\"\r\n\
                \r\n\
                42\r\n\
                --BOUNDARY\r\n\
                Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                ignored\r\n\
                --BOUNDARY--\r\n";

    let mut lookup = Lookup::default();
    bind_body(&mut lookup, &post("multipart/form-data; boundary=BOUNDARY", body)).unwrap();
    assert_eq!(lookup.id, 42);
}

#[test]
fn test_empty_body_is_noop_for_any_content_type() {
    let request = BindRequest::builder()
        .method(Method::POST)
        .header("content-type", "application/octet-stream")
        .build();

    let mut lookup = Lookup { id: 8 };
    bind_body(&mut lookup, &request).unwrap();
    assert_eq!(lookup.id, 8);
}

#[test]
fn test_unsupported_media_type() {
    let mut lookup = Lookup::default();
    let err = bind_body(&mut lookup, &post("text/plain", "id=1")).unwrap_err();

    assert!(matches!(
        &err,
        BindError::UnsupportedMediaType { content_type: Some(ct) } if ct == "text/plain"
    ));
    assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn test_missing_content_type_is_unsupported() {
    let request = BindRequest::builder()
        .method(Method::POST)
        .body(r#"{"id": 1}"#)
        .build();

    let mut lookup = Lookup::default();
    let err = bind_body(&mut lookup, &request).unwrap_err();
    assert!(matches!(
        err,
        BindError::UnsupportedMediaType { content_type: None }
    ));
}

#[test]
fn test_malformed_json_reports_position() {
    let mut lookup = Lookup::default();
    let err = bind_body(&mut lookup, &post("application/json", "{\n  \"id\": }")).unwrap_err();

    match err {
        BindError::MalformedBody { line, column, .. } => {
            assert_eq!(line, Some(2));
            assert!(column.is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_body_size_limit() {
    let binder = Binder::new(BinderConfig {
        max_body_size: 8,
        ..BinderConfig::default()
    });

    let mut lookup = Lookup::default();
    let err = binder
        .bind_body(&mut lookup, &post("application/json", r#"{"id": 123456}"#))
        .unwrap_err();
    assert!(matches!(err, BindError::PayloadTooLarge { max: 8, .. }));
}

#[test]
fn test_hooks_take_priority() {
    let mut search = Search::default();
    bind_query(&mut search, &get("/s?tags=a,b&tags=c&at=51.5:-0.12&addr=10.0.0.1")).unwrap();

    assert_eq!(search.tags, Csv(vec!["a".into(), "b".into(), "c".into()]));
    assert_eq!(search.at, Coordinates { lat: 51.5, lng: -0.12 });
    assert_eq!(search.addr.0, Ipv4Addr::new(10, 0, 0, 1));
}

#[test]
fn test_struct_with_hook_is_not_recursed_into() {
    let mut search = Search::default();
    bind_query(&mut search, &get("/s?lat=1&lng=2")).unwrap();
    assert_eq!(search.origin, Coordinates::default());
}

#[test]
fn test_text_hook_field_decodes_json_string() {
    let mut search = Search::default();
    bind_body(&mut search, &post("application/json", r#"{"addr": "192.168.1.9"}"#)).unwrap();
    assert_eq!(search.addr.0, Ipv4Addr::new(192, 168, 1, 9));
}

#[test]
fn test_hook_failure_is_reported() {
    let mut search = Search::default();
    let err = bind_query(&mut search, &get("/s?at=nowhere")).unwrap_err();
    assert!(matches!(err, BindError::Hook { .. }));
}

#[test]
fn test_map_destinations() {
    let source = SourceMap::from_query("a=1&a=2&b=3");

    let mut multi: HashMap<String, Vec<String>> = HashMap::new();
    populate(&mut multi, &source, Tag::Query).unwrap();
    assert_eq!(multi["a"], vec!["1", "2"]);

    let mut single: BTreeMap<String, String> = BTreeMap::new();
    populate(&mut single, &source, Tag::Form).unwrap();
    assert_eq!(single["a"], "1");
    assert_eq!(single["b"], "3");

    let mut numbers: HashMap<String, u32> = HashMap::new();
    populate(&mut numbers, &source, Tag::Query).unwrap();
    assert!(numbers.is_empty());
}

#[test]
fn test_opaque_destination_depends_on_tag() {
    let source = SourceMap::from_query("a=1");
    let mut list: Vec<u8> = Vec::new();

    populate(&mut list, &source, Tag::Query).unwrap();
    populate(&mut list, &source, Tag::Header).unwrap();

    let err = populate(&mut list, &source, Tag::Form).unwrap_err();
    assert!(matches!(
        err,
        BindError::UnsupportedDestinationShape { tag: Tag::Form }
    ));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_json_into_map_and_value() {
    let request = post("application/json", r#"{"name": "x", "tags": [1, 2]}"#);

    let mut value = serde_json::Value::Null;
    bind_all(&mut value, &request).unwrap();
    assert_eq!(value["tags"][1], 2);

    let mut map: HashMap<String, serde_json::Value> = HashMap::new();
    bind_body(&mut map, &request).unwrap();
    assert_eq!(map["name"], "x");
}
