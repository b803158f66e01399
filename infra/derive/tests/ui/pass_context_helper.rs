use conduit_derive::conduit_error;
use std::borrow::Cow;

#[conduit_error]
pub enum DemoError {
    #[error("Parse error{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<i64, DemoError> {
    raw.parse::<i64>().context("sensor frame")
}

fn main() {
    let Err(err) = parse("x") else {
        panic!("expected a parse failure");
    };
    assert!(err.to_string().starts_with("Parse error (sensor frame): "));
}
