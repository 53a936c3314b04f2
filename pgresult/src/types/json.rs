use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Decode, DecodeError,
    decode::Field,
    postgres::{Oid, PgFormat, PgType, oid},
};

/// Decode postgres `json` or `jsonb` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> PgType for Json<T> {
    /// jsonb, Binary JSON
    const OID: Oid = oid::JSONB;

    fn accepts(oid: Oid) -> bool {
        matches!(oid, oid::JSON | oid::JSONB)
    }
}

/// Binary `jsonb` is prefixed with its format version.
const JSONB_VERSION: u8 = 1;

impl<T> Decode for Json<T>
where
    T: DeserializeOwned,
{
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        let binary_jsonb = field.oid() == oid::JSONB && field.format() == PgFormat::Binary;
        let value = field.try_into_bytes()?;
        let json = match (binary_jsonb, &value[..]) {
            (false, json) => json,
            (true, [JSONB_VERSION, json @ ..]) => json,
            (true, [version, ..]) => {
                return Err(DecodeError::Parse(format!("unsupported jsonb version {version}")))
            },
            (true, []) => return Err(DecodeError::InvalidLength { expect: 1, found: 0 }),
        };
        Ok(Json(serde_json::from_slice(json)?))
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use std::collections::HashMap;

    use super::*;
    use crate::Column;

    #[test]
    fn decode_json() {
        let col = Column::new("j", oid::JSON);
        let field = Field::new(&col, Some(Bytes::from_static(br#"{"a":1}"#)));
        let Json(map) = field.decode::<Json<HashMap<String, i32>>>().unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn decode_binary_jsonb() {
        let col = Column::new("j", oid::JSONB).with_format(PgFormat::Binary);
        let field = Field::new(&col, Some(Bytes::from_static(b"\x01[1,2]")));
        assert_eq!(field.decode::<Json<Vec<i32>>>().unwrap(), Json(vec![1, 2]));

        let field = Field::new(&col, Some(Bytes::from_static(b"\x02[1,2]")));
        assert!(matches!(field.decode::<Json<Vec<i32>>>(), Err(DecodeError::Parse(_))));
    }

    #[test]
    fn decode_text_jsonb() {
        let col = Column::new("j", oid::JSONB);
        let field = Field::new(&col, Some(Bytes::from_static(b"[1,2]")));
        assert_eq!(field.decode::<Json<Vec<i32>>>().unwrap(), Json(vec![1, 2]));
        assert!(matches!(
            Field::new(&col, Some(Bytes::from_static(b"[1,"))).decode::<Json<Vec<i32>>>(),
            Err(DecodeError::Json(_))
        ));
    }
}
