mod common;
use crate::common::init_tracing;

use std::str::FromStr;

use infra_backend::errors::{AddressError, InexactNumber};
use infra_backend::logging::{resolve_level, LogLevel};
use infra_backend::operation::ResourceAddress;
use infra_backend::types::ValueKind;
use infra_backend::{OperationField, OperationType, Value};

#[test]
fn valid_resource_addresses_parse() {
    init_tracing();

    for raw in [
        "aws_instance.web",
        "data.aws_ami.ubuntu",
        "aws_instance.web[0]",
        "aws_instance.web[\"blue\"]",
        "module.net",
        "module.net.aws_subnet.private[1]",
        "module.a[2].module.b.null_resource.x",
    ] {
        let addr = ResourceAddress::parse(raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
        assert_eq!(addr.as_str(), raw);
    }
}

#[test]
fn invalid_resource_addresses_are_rejected() {
    init_tracing();

    for raw in ["", "aws_instance", "module.", "9bad.name", "aws_instance.web[", "a b.c"] {
        assert_eq!(
            ResourceAddress::parse(raw),
            Err(AddressError(raw.to_string())),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn module_addresses_are_recognised() {
    let module = ResourceAddress::parse("module.net").expect("valid");
    let nested = ResourceAddress::parse("module.net.module.subnets").expect("valid");
    let indexed = ResourceAddress::parse("module.net[\"a\"].module.subnets[0]").expect("valid");
    let resource = ResourceAddress::parse("module.net.aws_vpc.main").expect("valid");
    let data_source = ResourceAddress::parse("data.module.foo").expect("valid");
    let keyed = ResourceAddress::parse("aws_instance.web[\"x.module.y\"]").expect("valid");

    assert!(module.is_module());
    assert!(nested.is_module());
    assert!(indexed.is_module());
    assert!(!resource.is_module());
    assert!(!data_source.is_module(), "a data source whose type is named module");
    assert!(!keyed.is_module(), "a resource whose index key contains .module.");
}

#[test]
fn operation_types_round_trip_through_strings() {
    for op_type in OperationType::ALL {
        assert_eq!(OperationType::from_str(op_type.as_str()), Ok(op_type));
        assert_eq!(op_type.to_string(), op_type.as_str());
    }
    assert_eq!(" Apply ".parse::<OperationType>(), Ok(OperationType::Apply));
    assert!("deploy".parse::<OperationType>().is_err());
}

#[test]
fn operation_field_names_match_operation_attributes() {
    let names: Vec<&str> = OperationField::ALL.iter().map(|f| f.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "plan_id",
            "plan",
            "plan_refresh",
            "plan_out_path",
            "plan_out_backend",
            "module",
            "destroy",
            "targets",
            "variables",
        ]
    );
}

#[test]
fn prompted_values_are_parsed_by_kind() {
    assert_eq!(Value::parse_as(ValueKind::Number, " 3 "), Ok(Value::Number(3.0)));
    assert_eq!(Value::parse_as(ValueKind::Bool, "yes"), Ok(Value::Bool(true)));
    assert_eq!(
        Value::parse_as(ValueKind::String, "eu-west-1"),
        Ok(Value::from("eu-west-1"))
    );
    assert!(Value::parse_as(ValueKind::Number, "many").is_err());
    assert!(Value::parse_as(ValueKind::List, "[1]").is_err());
}

#[test]
fn integers_convert_only_when_exact() {
    let limit = 1_i64 << 53;

    assert_eq!(Value::try_from(limit), Ok(Value::Number(9_007_199_254_740_992.0)));
    assert_eq!(Value::try_from(-limit), Ok(Value::Number(-9_007_199_254_740_992.0)));
    assert_eq!(Value::try_from(limit + 1), Err(InexactNumber(limit + 1)));
    assert_eq!(Value::try_from(i64::MIN), Err(InexactNumber(i64::MIN)));
}

#[test]
fn log_levels_parse_case_insensitively() {
    assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
    assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert!("loud".parse::<LogLevel>().is_err());
}

#[test]
fn explicit_log_level_wins() {
    assert_eq!(resolve_level(Some(LogLevel::Trace)), tracing::Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Error)), tracing::Level::ERROR);
}
