//! UI payload entry points: camelCase JSON in, commands applied.

use crate::commands;
use crate::error::TransitError;
use crate::ids::{RouteKey, TransportType};
use crate::route_bindings::RouteBindings;
use crate::rule_store::RuleOrigin;
use crate::test_harness::{bus, TestTransit};

#[test]
fn test_add_custom_rule_from_payload() {
    let mut transit = TestTransit::new();
    let json = r#"{"ruleName":"Stadium","occupancy":65,"stdTicket":12,"maxTicketInc":50,"maxTicketDec":10,"maxVehAdj":20,"minVehAdj":-10}"#;
    let id = commands::add_custom_rule_from_payload(transit.world_mut(), json).unwrap();

    let rule = commands::get_rule(transit.world(), id).unwrap();
    assert_eq!(rule.name, "Stadium");
    assert_eq!(rule.occupancy_target_pct, 65);
    assert_eq!(rule.standard_ticket_price, 12);
    assert_eq!(rule.max_ticket_increase_pct, 50);
    assert_eq!(rule.max_ticket_discount_pct, 10);
    assert_eq!(rule.max_vehicle_adj_pct, 20);
    assert_eq!(rule.min_vehicle_adj_pct, -10);
    assert!(!id.is_legacy_range());
}

#[test]
fn test_add_custom_rule_rejects_bad_json() {
    let mut transit = TestTransit::new();
    let before = transit.rule_count();
    let result = commands::add_custom_rule_from_payload(transit.world_mut(), "{not json");
    assert!(matches!(result, Err(TransitError::InvalidPayload(_))));
    assert_eq!(transit.rule_count(), before);
}

#[test]
fn test_set_route_rule_binds_custom_rule() {
    let mut transit = TestTransit::new().with_route(bus(12), &[10], &[]);
    let id = commands::add_custom_rule_from_payload(
        transit.world_mut(),
        r#"{"ruleName":"Harbor","occupancy":40,"stdTicket":6}"#,
    )
    .unwrap();

    let json = format!(r#"{{"routeNumber":12,"transportType":"bus","ruleId":"{id}"}}"#);
    let route = commands::set_route_rule_from_payload(transit.world_mut(), &json).unwrap();
    assert_eq!(route, bus(12));
    let effective = transit.effective_rule(bus(12));
    assert_eq!(effective.rule.name, "Harbor");
    assert_eq!(effective.origin, RuleOrigin::Custom);
}

#[test]
fn test_empty_or_malformed_rule_id_unbinds() {
    let (transit, id) = TestTransit::new()
        .with_route(bus(3), &[10], &[])
        .with_rule(Default::default());
    let mut transit = transit.with_binding(bus(3), id);

    for raw in ["", "definitely-not-hex"] {
        transit
            .world_mut()
            .resource_mut::<RouteBindings>()
            .bind(bus(3), Some(id));
        let json = format!(r#"{{"routeNumber":3,"transportType":"Bus","ruleId":"{raw}"}}"#);
        commands::set_route_rule_from_payload(transit.world_mut(), &json).unwrap();
        assert_eq!(
            transit.world().resource::<RouteBindings>().rule_for(bus(3)),
            None,
            "ruleId {raw:?} should unbind"
        );
    }
}

#[test]
fn test_set_route_rule_errors() {
    let mut transit = TestTransit::new().with_route(bus(1), &[10], &[]);
    let world = transit.world_mut();

    let unknown_type = r#"{"routeNumber":1,"transportType":"Zeppelin","ruleId":""}"#;
    assert!(matches!(
        commands::set_route_rule_from_payload(world, unknown_type),
        Err(TransitError::InvalidPayload(_))
    ));

    let unknown_route = r#"{"routeNumber":99,"transportType":"Tram","ruleId":""}"#;
    assert_eq!(
        commands::set_route_rule_from_payload(world, unknown_route),
        Err(TransitError::UnknownRoute(RouteKey::new(TransportType::Tram, 99)))
    );

    let unknown_rule =
        r#"{"routeNumber":1,"transportType":"Bus","ruleId":"0000000000000000000000000000abcd"}"#;
    assert!(matches!(
        commands::set_route_rule_from_payload(world, unknown_rule),
        Err(TransitError::UnknownRule(_))
    ));

    let tram_default = TransportType::Tram.builtin_rule_id();
    let foreign = format!(
        r#"{{"routeNumber":1,"transportType":"Bus","ruleId":"{tram_default}"}}"#
    );
    assert!(matches!(
        commands::set_route_rule_from_payload(world, &foreign),
        Err(TransitError::ForeignBuiltinRule { .. })
    ));
}
