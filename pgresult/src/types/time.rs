use time::{
    Duration, PrimitiveDateTime, UtcDateTime,
    format_description::{BorrowedFormatItem as I, Component as C, modifier},
};

use crate::{
    Decode, DecodeError,
    decode::Field,
    postgres::{Oid, PgFormat, PgType, oid},
};

impl PgType for PrimitiveDateTime {
    /// date and time
    const OID: Oid = oid::TIMESTAMP;
}

impl PgType for UtcDateTime {
    /// date and time with timezone
    const OID: Oid = oid::TIMESTAMPTZ;
}

/// `2000-01-01`, julian day from `from_julian_day` docs
const PG_EPOCH_DATE: time::Date = match time::Date::from_julian_day(2_451_545) {
    Ok(ok) => ok,
    Err(_) => panic!("postgres epoch is a valid date"),
};

const PRIMITIVE_PG_EPOCH: PrimitiveDateTime = PrimitiveDateTime::new(PG_EPOCH_DATE, time::Time::MIDNIGHT);

const UTC_PG_EPOCH: UtcDateTime = UtcDateTime::new(PG_EPOCH_DATE, time::Time::MIDNIGHT);

/// Binary timestamp is microseconds since postgres epoch.
fn microseconds(field: Field<'_>) -> Result<Duration, DecodeError> {
    let value = field.try_into_bytes()?;
    let be = <[u8; 8]>::try_from(&value[..])
        .map_err(|_| DecodeError::InvalidLength { expect: size_of::<i64>(), found: value.len() })?;
    Ok(Duration::microseconds(i64::from_be_bytes(be)))
}

impl Decode for PrimitiveDateTime {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        match field.format() {
            PgFormat::Binary => Ok(PRIMITIVE_PG_EPOCH.saturating_add(microseconds(field)?)),
            PgFormat::Text => {
                let value = field.try_into_bytes()?;
                let text = std::str::from_utf8(&value)?;
                PrimitiveDateTime::parse(text, DESCRIPTION)
                    .map_err(|e| DecodeError::Parse(e.to_string()))
            },
        }
    }
}

impl Decode for UtcDateTime {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        match field.format() {
            PgFormat::Binary => Ok(UTC_PG_EPOCH.saturating_add(microseconds(field)?)),
            // text output depends on the session `TimeZone`
            PgFormat::Text => Err(DecodeError::UnsupportedFormat(PgFormat::Text)),
        }
    }
}

/// `2025-01-31 12:30:00.123456`, fraction omitted when zero.
const DESCRIPTION: &[I<'_>] = &[
    I::Component(C::Year(modifier::Year::default())),
    I::Literal(b"-"),
    I::Component(C::Month(modifier::Month::default())),
    I::Literal(b"-"),
    I::Component(C::Day(modifier::Day::default())),
    I::Literal(b" "),
    I::Component(C::Hour(modifier::Hour::default())),
    I::Literal(b":"),
    I::Component(C::Minute(modifier::Minute::default())),
    I::Literal(b":"),
    I::Component(C::Second(modifier::Second::default())),
    I::Optional(&I::Compound(SUBSECOND)),
];

const SUBSECOND: &[I<'_>] = &[
    I::Literal(b"."),
    I::Component(C::Subsecond(modifier::Subsecond::default())),
];
