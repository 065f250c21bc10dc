use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_jsurl::{
    from_reader, from_slice, from_str, from_str_with_options, from_value, to_string,
    to_string_with_options, to_value, to_writer, DecodeOptions, EncodeOptions, Error, Value,
};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Search {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
    since: DateTime<Utc>,
    sort: Sort,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Sort {
    Relevance,
    Field { name: String, descending: bool },
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

#[test]
fn test_simple_struct() {
    let user = alice();

    let text = to_string(&user).unwrap();
    assert_eq!(text, "(id~123~name~Alice~active~~tags~!admin~developer)~");

    let user_back: User = from_str(&text).unwrap();
    assert_eq!(user, user_back);
}

#[test]
fn test_nested_struct() {
    let order = Order {
        order_id: 12345,
        customer: alice(),
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
    };

    let text = to_string(&order).unwrap();
    assert!(text.contains("customer~(id~123~"));
    assert!(text.contains("items~!(sku~WIDGET-001~price~29.99~quantity~2)(sku~GADGET-002~"));

    let order_back: Order = from_str(&text).unwrap();
    assert_eq!(order, order_back);
}

#[test]
fn test_short_output_in_query() {
    let order = Order {
        order_id: 1,
        customer: alice(),
        items: vec![],
        total: 0.0,
    };

    let text = to_string_with_options(&order, EncodeOptions::short()).unwrap();
    assert_eq!(
        text,
        "(order*_id~1~customer~(id~123~name~Alice~active~~tags~!admin~developer)items~!~total~0"
    );
    assert!(!text.contains(['%', '?', '#', '&', '=']));

    let back: Order = from_str_with_options(&text, DecodeOptions::short()).unwrap();
    assert_eq!(order, back);
}

#[test]
fn test_percent_encoded_query() {
    // Clients may percent-encode characters that need no escaping.
    let text = "(id~7~name~Bob%20Smith~active~_F~tags~!a%2A%2Ab~)~";
    let user: User = from_str_with_options(text, DecodeOptions::new().with_de_uri(true)).unwrap();
    assert_eq!(user.name, "Bob Smith");
    assert!(!user.active);
    assert_eq!(user.tags, vec!["a*b".to_string()]);
}

#[test]
fn test_dates_and_enums() {
    let search = Search {
        query: "rust (lang)".to_string(),
        cursor: None,
        since: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        sort: Sort::Field {
            name: "stars".to_string(),
            descending: true,
        },
    };

    let text = to_string(&search).unwrap();
    assert_eq!(
        text,
        "(query~rust_*Clang*D~since~*2024-05-01T12:30:00Z~sort~(Field~(name~stars~descending)))~"
    );

    let back: Search = from_str(&text).unwrap();
    assert_eq!(search, back);

    let relevance = Search {
        sort: Sort::Relevance,
        cursor: Some("abc".to_string()),
        ..search
    };
    let back: Search = from_str(&to_string(&relevance).unwrap()).unwrap();
    assert_eq!(relevance, back);
}

#[test]
fn test_maps_keep_insertion_order() {
    let value = to_value(&BTreeMap::from([("b", 2), ("a", 1)])).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["a", "b"]);

    let json: serde_json::Value = from_str("(z~1~y~2~x~3)~").unwrap();
    let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["z", "y", "x"]);
}

#[test]
fn test_primitives() {
    assert_eq!(to_string(&42).unwrap(), "42~");
    assert_eq!(to_string(&-7i8).unwrap(), "-7~");
    assert_eq!(to_string(&true).unwrap(), "~");
    assert_eq!(to_string(&false).unwrap(), "_F~");
    assert_eq!(to_string(&()).unwrap(), "_N~");
    assert_eq!(to_string(&None::<u8>).unwrap(), "_N~");
    assert_eq!(to_string(&'x').unwrap(), "x~");
    assert_eq!(to_string("3 apples").unwrap(), "*3_apples~");

    assert_eq!(from_str::<u64>("42~").unwrap(), 42);
    assert!(from_str::<bool>("~").unwrap());
    assert_eq!(from_str::<Option<u8>>("_U~").unwrap(), None);
    assert_eq!(from_str::<String>("*3_apples~").unwrap(), "3 apples");
}

#[test]
fn test_numbers() {
    let values = vec![0.1, -2.5, 1e21, 1.5e-7, 123456.789, f64::MAX, f64::MIN_POSITIVE];
    let text = to_string(&values).unwrap();
    let back: Vec<f64> = from_str(&text).unwrap();
    assert_eq!(values, back);

    assert_eq!(to_string(&f64::NAN).unwrap(), "_N~");
    assert_eq!(from_str::<Option<f64>>("_N~").unwrap(), None);
    assert_eq!(to_string(&u64::MAX).unwrap(), "18446744073709552000~");
}

#[test]
fn test_empty_collections() {
    let empty: Vec<u8> = vec![];
    assert_eq!(to_string(&empty).unwrap(), "!~");
    assert_eq!(from_str::<Vec<u8>>("!~").unwrap(), empty);

    let map: BTreeMap<String, u8> = BTreeMap::new();
    assert_eq!(to_string(&map).unwrap(), "()~");
    assert_eq!(from_str::<BTreeMap<String, u8>>("()~").unwrap(), map);
}

#[test]
fn test_special_strings() {
    let strings = vec![
        "".to_string(),
        " ".to_string(),
        "_U".to_string(),
        "~".to_string(),
        "()".to_string(),
        "!".to_string(),
        "-1".to_string(),
        "a=b&c=d?e#f".to_string(),
        "line\nbreak\r\0".to_string(),
        "quote's <tag> 100% back\\slash".to_string(),
        "emoji \u{1f980}".to_string(),
    ];
    let text = to_string(&strings).unwrap();
    assert!(!text.contains(['%', '?', '#', '&', '=', '\n', '\r', '\0', '\'', '<', '\\']));

    let back: Vec<String> = from_str(&text).unwrap();
    assert_eq!(strings, back);
}

#[test]
fn test_unrepresentable_keys() {
    let mut map = BTreeMap::new();
    map.insert((1, 2), "pair");
    assert!(matches!(
        to_string(&map),
        Err(Error::UnrepresentableValue(_))
    ));
}

#[test]
fn test_type_mismatch() {
    let err = from_str::<User>("!1~2~").unwrap_err();
    assert!(matches!(err, Error::Custom(_)));

    let err = from_str::<u8>("-1~").unwrap_err();
    assert!(matches!(err, Error::Custom(_)));
}

#[test]
fn test_io_round_trip() {
    let mut buffer = Vec::new();
    to_writer(&mut buffer, &alice()).unwrap();
    assert_eq!(from_slice::<User>(&buffer).unwrap(), alice());
    assert_eq!(from_reader::<_, User>(buffer.as_slice()).unwrap(), alice());
}

#[test]
fn test_from_value() {
    let value: Value = "(id~1~name~x~active~_F~tags~!~)~".parse().unwrap();
    let user: User = from_value(value).unwrap();
    assert_eq!(user.id, 1);
    assert!(user.tags.is_empty());
}
