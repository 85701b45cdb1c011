//! Marshalling for CQL `uuid` and `timeuuid` columns.
//!
//! A CQL driver's codec registry dispatches on capability: any value implementing [`Marshaler`]
//! can be bound as a query parameter, and any value implementing [`Unmarshaler`] can be filled
//! from a result column. Both methods receive a [`TypeInfo`] describing the column. The UUID
//! encoding does not depend on it, so the impls here accept the descriptor and ignore it.

use crate::{Uuid, UuidResult};

/// Column type as reported by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CqlType {
    Uuid,
    TimeUuid,
    Blob,
    Custom,
}

/// Type descriptor passed alongside every marshal and unmarshal call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    kind: CqlType,
    protocol_version: u8,
    custom: Option<String>,
}

impl TypeInfo {
    /// Descriptor for a native column at the default protocol version.
    pub fn new(kind: CqlType) -> Self {
        Self {
            kind,
            protocol_version: 4,
            custom: None,
        }
    }

    /// Descriptor for a custom column type identified by its class name.
    pub fn custom(class_name: impl Into<String>) -> Self {
        Self {
            kind: CqlType::Custom,
            protocol_version: 4,
            custom: Some(class_name.into()),
        }
    }

    /// Sets the native protocol version the column was read with.
    ///
    /// # Arguments
    ///
    /// * `protocol_version` - Protocol version byte as negotiated by the driver (3, 4 or 5).
    ///
    /// # Returns
    ///
    /// Returns the updated descriptor.
    pub fn with_protocol_version(mut self, protocol_version: u8) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    /// Returns the column type.
    pub fn kind(&self) -> CqlType {
        self.kind
    }

    /// Returns the protocol version byte.
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Returns the class name of a custom column type, or `None` for native types.
    pub fn custom_class(&self) -> Option<&str> {
        self.custom.as_deref()
    }
}

/// Encodes a value into the bytes of a CQL column.
pub trait Marshaler {
    fn marshal_cql(&self, info: &TypeInfo) -> UuidResult<Vec<u8>>;
}

/// Decodes the bytes of a CQL column into an existing value.
///
/// Implementations must leave `self` untouched when they return an error.
pub trait Unmarshaler {
    fn unmarshal_cql(&mut self, info: &TypeInfo, data: &[u8]) -> UuidResult<()>;
}

/// Marshals `value` the way the driver does when binding a query parameter.
///
/// # Arguments
///
/// * `info` - Descriptor of the target column.
/// * `value` - Any value implementing [`Marshaler`].
///
/// # Returns
///
/// Returns the column bytes, empty for a null value.
pub fn marshal<T>(info: &TypeInfo, value: &T) -> UuidResult<Vec<u8>>
where
    T: Marshaler + ?Sized,
{
    value.marshal_cql(info)
}

/// Unmarshals `data` into `value` the way the driver does when scanning a result column.
///
/// # Arguments
///
/// * `info` - Descriptor of the source column.
/// * `data` - Raw column bytes.
/// * `value` - Receiver, overwritten only on success.
///
/// # Errors
///
/// Propagates the receiver's decode error, for [`Uuid`] a [`crate::UuidError::Format`].
pub fn unmarshal<T>(info: &TypeInfo, data: &[u8], value: &mut T) -> UuidResult<()>
where
    T: Unmarshaler + ?Sized,
{
    value.unmarshal_cql(info, data)
}

impl Marshaler for Uuid {
    fn marshal_cql(&self, _info: &TypeInfo) -> UuidResult<Vec<u8>> {
        Ok(self.to_bytes().to_vec())
    }
}

impl Unmarshaler for Uuid {
    fn unmarshal_cql(&mut self, _info: &TypeInfo, data: &[u8]) -> UuidResult<()> {
        // Parse before assigning so a bad buffer leaves the receiver intact.
        *self = Uuid::from_bytes(data)?;
        Ok(())
    }
}

// A null column arrives as an empty buffer.
impl Marshaler for Option<Uuid> {
    fn marshal_cql(&self, info: &TypeInfo) -> UuidResult<Vec<u8>> {
        match self {
            Some(uuid) => uuid.marshal_cql(info),
            None => Ok(Vec::new()),
        }
    }
}

impl Unmarshaler for Option<Uuid> {
    fn unmarshal_cql(&mut self, _info: &TypeInfo, data: &[u8]) -> UuidResult<()> {
        *self = if data.is_empty() {
            None
        } else {
            Some(Uuid::from_bytes(data)?)
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UuidError;

    fn uuid_type() -> TypeInfo {
        TypeInfo::new(CqlType::Uuid)
    }

    #[test]
    fn test_marshal_produces_raw_bytes() {
        let uid = Uuid::new_v4().unwrap();

        let marshalled = marshal(&uuid_type(), &uid).unwrap();
        let parsed = Uuid::from_bytes(&marshalled).unwrap();

        assert_eq!(marshalled.len(), 16);
        assert_eq!(parsed.to_string(), uid.to_string());
    }

    #[test]
    fn test_unmarshal_into_fresh_value() {
        let uid = Uuid::new_v4().unwrap();
        let bytes = marshal(&uuid_type(), &uid).unwrap();

        let mut decoded = Uuid::default();
        unmarshal(&uuid_type(), &bytes, &mut decoded).unwrap();

        assert_eq!(decoded, uid);
        assert_eq!(decoded.to_string(), uid.to_string());
    }

    #[test]
    fn test_unmarshal_raw_bytes() {
        let uid = Uuid::new_v4().unwrap();

        let mut decoded = Uuid::default();
        unmarshal(&uuid_type(), &uid.to_bytes(), &mut decoded).unwrap();

        assert_eq!(decoded.to_string(), uid.to_string());
    }

    #[test]
    fn test_type_info_is_ignored() {
        let uid = Uuid::new_v1().unwrap();
        let descriptors = [
            TypeInfo::new(CqlType::Uuid),
            TypeInfo::new(CqlType::TimeUuid).with_protocol_version(3),
            TypeInfo::new(CqlType::Blob),
            TypeInfo::custom("org.apache.cassandra.db.marshal.UUIDType"),
        ];

        let expected = uid.to_bytes().to_vec();
        for info in &descriptors {
            assert_eq!(marshal(info, &uid).unwrap(), expected);

            let mut decoded = Uuid::nil();
            unmarshal(info, &expected, &mut decoded).unwrap();
            assert_eq!(decoded, uid);
        }
    }

    #[test]
    fn test_unmarshal_wrong_length_leaves_value_unchanged() {
        let original = Uuid::new_v4().unwrap();
        let mut target = original;

        let result = unmarshal(&uuid_type(), b"invalid", &mut target);

        assert!(matches!(result, Err(UuidError::Format { .. })));
        assert_eq!(target, original);
    }

    #[test]
    fn test_unmarshal_empty_into_uuid_is_error() {
        let mut target = Uuid::nil();

        assert!(unmarshal(&uuid_type(), &[], &mut target).is_err());
    }

    #[test]
    fn test_option_null_round_trip() {
        let none: Option<Uuid> = None;
        let bytes = marshal(&uuid_type(), &none).unwrap();
        assert!(bytes.is_empty());

        let mut decoded = Some(Uuid::new_v4().unwrap());
        unmarshal(&uuid_type(), &bytes, &mut decoded).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_option_some_round_trip() {
        let uid = Uuid::new_v4().unwrap();
        let bytes = marshal(&uuid_type(), &Some(uid)).unwrap();
        assert_eq!(bytes, uid.to_bytes().to_vec());

        let mut decoded: Option<Uuid> = None;
        unmarshal(&uuid_type(), &bytes, &mut decoded).unwrap();
        assert_eq!(decoded, Some(uid));
    }

    #[test]
    fn test_option_unmarshal_error_leaves_value_unchanged() {
        let original = Some(Uuid::new_v4().unwrap());
        let mut target = original;

        assert!(unmarshal(&uuid_type(), &[1, 2, 3], &mut target).is_err());
        assert_eq!(target, original);
    }

    #[test]
    fn test_dispatch_through_trait_objects() {
        let uid = Uuid::new_v4().unwrap();
        let encoder: &dyn Marshaler = &uid;
        let bytes = marshal(&uuid_type(), encoder).unwrap();

        let mut decoded = Uuid::nil();
        let decoder: &mut dyn Unmarshaler = &mut decoded;
        unmarshal(&uuid_type(), &bytes, decoder).unwrap();

        assert_eq!(decoded, uid);
    }

    #[test]
    fn test_type_info_accessors() {
        let info = TypeInfo::custom("custom").with_protocol_version(5);

        assert_eq!(info.kind(), CqlType::Custom);
        assert_eq!(info.protocol_version(), 5);
        assert_eq!(info.custom_class(), Some("custom"));
        assert_eq!(TypeInfo::new(CqlType::Uuid).custom_class(), None);
    }
}
