//! Common attenuation idioms expanded into ordinary checks

use chrono::{DateTime, Utc};

use crate::builder::{check_one, constrained_rule, date, pred, rule, string, var, Binary, Check, Expression};
use crate::error::Error;

/// `check if resource($resource), operation(right), right($resource, right)`
pub fn check_right(right: &str) -> Check {
    check_one(&[rule(
        "check_right",
        &[string(right)],
        &[
            pred("resource", &[var("resource")]),
            pred("operation", &[string(right)]),
            pred("right", &[var("resource"), string(right)]),
        ],
    )])
}

/// `check if resource($resource), $resource.starts_with(prefix)`
pub fn resource_prefix(prefix: &str) -> Check {
    check_one(&[constrained_rule(
        "prefix",
        &[var("resource")],
        &[pred("resource", &[var("resource")])],
        &[Expression::binary(Binary::Prefix, var("resource"), string(prefix))],
    )])
}

/// `check if resource($resource), $resource.ends_with(suffix)`
pub fn resource_suffix(suffix: &str) -> Check {
    check_one(&[constrained_rule(
        "suffix",
        &[var("resource")],
        &[pred("resource", &[var("resource")])],
        &[Expression::binary(Binary::Suffix, var("resource"), string(suffix))],
    )])
}

/// `check if time($date), $date <= expiration`
///
/// The bound is inclusive: a request presented exactly at `expiration`
/// still passes.
pub fn expiration_date(expiration: DateTime<Utc>) -> Result<Check, Error> {
    Ok(check_one(&[constrained_rule(
        "expiration",
        &[var("date")],
        &[pred("time", &[var("date")])],
        &[Expression::binary(Binary::LessOrEqual, var("date"), date(expiration)?)],
    )]))
}
