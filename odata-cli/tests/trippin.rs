//! End-to-end: schema config -> resource URLs -> response decoding -> re-serialization

use std::collections::HashMap;
use std::sync::Arc;

use odata_cli::{
    ApiConfig, CodecOptions, Entity, Expand, MetadataLevel, ODataError, ODataValue, QueryOptions,
    Resource, ResponseEnvelope, SchemaRegistry, Version,
};
use serde_json::json;

fn trippin_config(version: &str) -> ApiConfig {
    ApiConfig::from_json(json!({
        "service_root_url": "https://services.odata.org/V4/TripPinServiceRW",
        "version": version,
        "schemas": [{
            "namespace": "Microsoft.OData.SampleService.Models.TripPin",
            "enums": [{
                "name": "PersonGender",
                "flags": true,
                "members": [
                    {"name": "Male", "value": 1},
                    {"name": "Female", "value": 2},
                    {"name": "Unknown", "value": 4}
                ]
            }],
            "entities": [
                {
                    "name": "Person",
                    "keys": ["UserName"],
                    "fields": [
                        {"name": "UserName", "type": "Edm.String", "nullable": false},
                        {"name": "FirstName", "type": "Edm.String"},
                        {"name": "LastName", "type": "Edm.String"},
                        {"name": "Emails", "type": "Collection(Edm.String)"},
                        {"name": "AddressInfo", "type": "Collection(Location)"},
                        {"name": "Gender", "type": "PersonGender"},
                        {"name": "Concurrency", "type": "Edm.Int64"},
                        {"name": "Friends", "type": "Person", "collection": true, "navigation": true},
                        {"name": "Trips", "type": "Trip", "collection": true, "navigation": true}
                    ]
                },
                {
                    "name": "Employee",
                    "base": "Person",
                    "fields": [{"name": "Cost", "type": "Edm.Int64"}]
                },
                {
                    "name": "Trip",
                    "keys": ["TripId"],
                    "fields": [
                        {"name": "TripId", "type": "Edm.Int32", "nullable": false},
                        {"name": "ShareId", "type": "Edm.Guid"},
                        {"name": "Name", "type": "Edm.String"},
                        {"name": "Budget", "type": "Edm.Single"},
                        {"name": "StartsAt", "type": "Edm.DateTimeOffset"},
                        {"name": "Duration", "type": "Edm.Duration"}
                    ]
                }
            ],
            "complexes": [
                {
                    "name": "Location",
                    "fields": [
                        {"name": "Address", "type": "Edm.String"},
                        {"name": "City", "type": "City"}
                    ]
                },
                {
                    "name": "City",
                    "fields": [
                        {"name": "CountryRegion", "type": "Edm.String"},
                        {"name": "Name", "type": "Edm.String"},
                        {"name": "Region", "type": "Edm.String"}
                    ]
                }
            ]
        }]
    }))
    .unwrap()
}

const PERSON: &str = "Microsoft.OData.SampleService.Models.TripPin.Person";

fn registry(version: &str) -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::configure(&trippin_config(version)).unwrap())
}

fn people(version: &str) -> Resource {
    Resource::root(registry(version))
        .entity_set("People", PERSON)
        .unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn russell() -> serde_json::Value {
    json!({
        "UserName": "russellwhyte",
        "FirstName": "Russell",
        "LastName": "Whyte",
        "Emails": ["Russell@example.com", "Russell@contoso.com"],
        "AddressInfo": [{
            "Address": "187 Suffolk Ln.",
            "City": {"CountryRegion": "United States", "Name": "Boise", "Region": "ID"}
        }],
        "Gender": "Male",
        "Concurrency": 635404797346655200i64
    })
}

#[test]
fn test_resource_urls() {
    let trips = people("4.0")
        .key("russellwhyte")
        .unwrap()
        .navigation_property("Trips")
        .unwrap()
        .select(["Name", "Budget"])
        .filter("Budget gt 3000")
        .top(5);
    assert_eq!(
        trips.url(),
        "https://services.odata.org/V4/TripPinServiceRW/People('russellwhyte')/Trips\
         ?$select=Name,Budget&$filter=Budget gt 3000&$top=5"
    );

    let expanded = people("4.0").expand(
        Expand::new("Friends").with(QueryOptions::new().select(["UserName"]).top(2)),
    );
    assert_eq!(
        expanded.to_string(),
        "People?$expand=Friends($select=UserName;$top=2)"
    );
}

#[test]
fn test_entity_roundtrip_through_envelope() {
    let person = people("4.0").key("russellwhyte").unwrap();
    let mut body = russell();
    body["@odata.context"] = json!("https://services.odata.org/V4/TripPinServiceRW/$metadata#People/$entity");
    body["@odata.etag"] = json!("W/\"08D1694BF26D2BC9\"");

    let response = ResponseEnvelope::new(
        person.clone(),
        200,
        headers(&[
            ("Content-Type", "application/json; odata.metadata=minimal"),
            ("OData-Version", "4.0"),
        ]),
        Some(body),
    );
    let entity = response.entity().unwrap().unwrap();
    assert_eq!(entity.meta.etag.as_deref(), Some("W/\"08D1694BF26D2BC9\""));

    let fields = entity.data.as_entity().unwrap();
    assert_eq!(fields.get("Gender"), Some(&ODataValue::Enum(1)));
    assert_eq!(fields.get("Emails").unwrap().as_collection().unwrap().len(), 2);

    // Annotations were split off, so re-serializing yields the plain entity
    assert_eq!(person.serialize(&entity.data).unwrap(), russell());
}

#[test]
fn test_v2_and_v4_envelopes_are_equivalent() {
    let v4 = ResponseEnvelope::new(
        people("4.0"),
        200,
        headers(&[("OData-Version", "4.0")]),
        Some(json!({
            "@odata.context": "$metadata#People",
            "@odata.nextLink": "People?$skiptoken=8",
            "value": [russell()]
        })),
    );

    let mut v2_person = russell();
    v2_person["__metadata"] = json!({
        "uri": "https://services.odata.org/V2/People('russellwhyte')",
        "type": PERSON
    });
    v2_person["Emails"] = json!({"results": ["Russell@example.com", "Russell@contoso.com"]});
    v2_person["Friends"] = json!({"__deferred": {"uri": "People('russellwhyte')/Friends"}});
    let v2 = ResponseEnvelope::new(
        people("2.0"),
        200,
        headers(&[("DataServiceVersion", "2.0;")]),
        Some(json!({"d": {"results": [v2_person], "__next": "People?$skiptoken=8"}})),
    );

    let v4 = v4.entities().unwrap().unwrap();
    let v2 = v2.entities().unwrap().unwrap();
    assert_eq!(v4.meta.next_link, v2.meta.next_link);

    // v2 announces its type; apart from that the decoded data is identical
    let mut v2_data = v2.data.clone();
    if let Some(ODataValue::Entity(entity)) = v2_data.first_mut() {
        assert_eq!(entity.type_name.as_deref(), Some(PERSON));
        entity.type_name = None;
    }
    assert_eq!(v2_data, v4.data);
}

#[test]
fn test_polymorphic_dispatch_with_full_metadata() {
    let response = ResponseEnvelope::new(
        people("4.0"),
        200,
        headers(&[("Content-Type", "application/json;odata.metadata=full;IEEE754Compatible=true")]),
        Some(json!({"value": [
            {"@odata.type": "#Microsoft.OData.SampleService.Models.TripPin.Employee",
             "UserName": "kristakemp", "Cost": "1000000"},
            {"UserName": "russellwhyte"}
        ]})),
    );
    assert!(response.options().ieee754_compatible);

    let entities = response.entities().unwrap().unwrap();
    let employee = entities.data[0].as_entity().unwrap();
    assert_eq!(
        employee.type_name.as_deref(),
        Some("Microsoft.OData.SampleService.Models.TripPin.Employee")
    );
    assert_eq!(employee.get("Cost"), Some(&ODataValue::Int(1_000_000)));
    assert_eq!(entities.data[1].as_entity().unwrap().type_name, None);

    // Serializing through the base type keeps the derived discriminator
    let options = CodecOptions {
        ieee754_compatible: true,
        ..response.options().codec_options(&CodecOptions::default())
    };
    let resource = people("4.0");
    let parser = resource.registry().structured(PERSON).unwrap();
    let wire = parser.serialize(&entities.data[0], &options).unwrap();
    assert_eq!(
        wire,
        json!({
            "@odata.type": "#Microsoft.OData.SampleService.Models.TripPin.Employee",
            "UserName": "kristakemp",
            "Cost": "1000000"
        })
    );
}

#[test]
fn test_flags_gender_and_qualified_enums() {
    let config = ApiConfig {
        string_as_enum: false,
        ..trippin_config("4.0")
    };
    let registry = SchemaRegistry::configure(&config).unwrap();
    let options = registry.options();
    let person = registry.structured(PERSON).unwrap();

    let entity = Entity::new()
        .with("UserName", "russellwhyte".into())
        .with("Gender", ODataValue::Enum(3));
    let wire = person.serialize(&entity.into(), &options).unwrap();
    assert_eq!(
        wire["Gender"],
        json!("Microsoft.OData.SampleService.Models.TripPin.PersonGender'Male, Female'")
    );

    let decoded = person
        .deserialize(&json!({"Gender": "Male, Female, Unknown"}), &options)
        .unwrap();
    assert_eq!(decoded.as_entity().unwrap().get("Gender"), Some(&ODataValue::Enum(7)));

    assert!(matches!(
        person.deserialize(&json!({"Gender": "Male, Robot"}), &options),
        Err(ODataError::UnknownEnumMember { .. })
    ));
}

#[test]
fn test_trip_values_and_key_literals() {
    let registry = registry("4.0");
    let trip_type = "Microsoft.OData.SampleService.Models.TripPin.Trip";
    let trips = Resource::root(registry.clone())
        .entity_set("Trips", trip_type)
        .unwrap();

    let payload = json!({
        "TripId": 1003,
        "ShareId": "f94e9116-8bdd-4dac-ab61-08438d0d9a71",
        "Name": "Trip in Beijing",
        "Budget": "INF",
        "StartsAt": "2014-02-01T00:00:00Z",
        "Duration": "P1DT2H"
    });
    let decoded = trips.deserialize(&payload).unwrap();
    let entity = decoded.as_entity().unwrap();
    assert_eq!(entity.get("Budget"), Some(&ODataValue::Float(f64::INFINITY)));
    assert_eq!(trips.serialize(&decoded).unwrap(), payload);

    let keyed = trips
        .entity_key(&Entity::new().with("TripId", ODataValue::Int(1003)))
        .unwrap();
    assert_eq!(keyed.path(), "Trips(1003)");
}

#[test]
fn test_v2_expansion_with_deferred_links() {
    let response = ResponseEnvelope::new(
        people("2.0").key("russellwhyte").unwrap().expand(Expand::new("Friends")),
        200,
        headers(&[("DataServiceVersion", "2.0")]),
        Some(json!({"d": {
            "UserName": "russellwhyte",
            "Friends": {"results": [{
                "UserName": "scottketchum",
                "Friends": {"__deferred": {"uri": "People('scottketchum')/Friends"}}
            }]},
            "Trips": {"__deferred": {"uri": "People('russellwhyte')/Trips"}}
        }})),
    );
    let entity = response.entity().unwrap().unwrap();
    assert_eq!(
        entity.meta.navigation_links.get("Trips").map(String::as_str),
        Some("People('russellwhyte')/Trips")
    );

    let friends = entity.data.as_entity().unwrap().get("Friends").unwrap();
    let scott = friends.as_collection().unwrap()[0].as_entity().unwrap();
    assert_eq!(
        scott.get("UserName"),
        Some(&ODataValue::String("scottketchum".into()))
    );
    assert!(matches!(scott.get("Friends"), Some(ODataValue::Raw(_))));
}

#[test]
fn test_budget_keeps_integral_form() {
    let trips = Resource::root(registry("4.0"))
        .entity_set("Trips", "Microsoft.OData.SampleService.Models.TripPin.Trip")
        .unwrap();
    let payload = json!({"TripId": 1001, "Budget": 3000});
    let decoded = trips.deserialize(&payload).unwrap();
    assert_eq!(trips.serialize(&decoded).unwrap(), payload);
}

#[test]
fn test_type_mismatch_reports_path() {
    let err = people("4.0")
        .deserialize(&json!({"AddressInfo": [{"City": {"Name": 5}}]}))
        .unwrap_err();
    match err {
        ODataError::TypeMismatch { path, .. } => assert_eq!(path, "AddressInfo[0].City.Name"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_version_defaults_come_from_config() {
    let response = ResponseEnvelope::new(people("3.0"), 200, HashMap::new(), Some(json!({})));
    assert_eq!(response.options().version, Version::V3);
    assert_eq!(response.options().metadata, MetadataLevel::Minimal);
    assert_eq!(people("2.0").inline_count(true).query_string(), "$inlinecount=allpages");
}
