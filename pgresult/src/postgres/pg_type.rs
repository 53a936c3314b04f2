
/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// Reserved [`Oid`] which refer to no object.
///
/// Returned as source table of a column that is not a simple reference to a table column,
/// e.g. computed expression.
pub const INVALID_OID: Oid = 0;

/// Builtin type oids.
///
/// <https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat>
pub mod oid {
    use super::Oid;

    pub const BOOL: Oid = 16;
    pub const BYTEA: Oid = 17;
    pub const CHAR: Oid = 18;
    pub const NAME: Oid = 19;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const OID: Oid = 26;
    pub const JSON: Oid = 114;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const UNKNOWN: Oid = 705;
    pub const BPCHAR: Oid = 1042;
    pub const VARCHAR: Oid = 1043;
    pub const DATE: Oid = 1082;
    pub const TIME: Oid = 1083;
    pub const TIMESTAMP: Oid = 1114;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const NUMERIC: Oid = 1700;
    pub const UUID: Oid = 2950;
    pub const JSONB: Oid = 3802;
}

/// A type that have corresponding postgres oid.
pub trait PgType {
    const OID: Oid;

    /// Returns `true` if value of the given type oid can be decoded as `Self`.
    ///
    /// By default, only exact [`PgType::OID`] is accepted.
    fn accepts(oid: Oid) -> bool {
        oid == Self::OID
    }
}

macro_rules! oid {
    ($ty:ty, $oid:expr $(, $doc:literal)? ) => {
        impl PgType for $ty {
            $(#[doc = $doc])?
            const OID: Oid = $oid;
        }
    };
}

oid!(bool, oid::BOOL, "`bool` boolean, 'true'/'false'");
oid!(i64, oid::INT8, "`int8` ~18 digit integer, 8-byte storage");
oid!(i16, oid::INT2, "`int2` -32 thousand to 32 thousand, 2-byte storage");
oid!(i32, oid::INT4, "`int4` -2 billion to 2 billion integer, 4-byte storage");
oid!(f32, oid::FLOAT4, "`float4` single-precision floating point number, 4-byte storage");
oid!(f64, oid::FLOAT8, "`float8` double-precision floating point number, 8-byte storage");
oid!(Vec<u8>, oid::BYTEA, "`bytea` variable-length string, binary values escaped");
oid!(bytes::Bytes, oid::BYTEA, "`bytea` variable-length string, binary values escaped");

impl PgType for String {
    /// `text` variable-length string, no limit specified
    const OID: Oid = oid::TEXT;

    fn accepts(oid: Oid) -> bool {
        matches!(
            oid,
            oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::UNKNOWN | oid::CHAR
        )
    }
}
