use thiserror::Error;

/// Standard device identification object ids.
pub const OBJECT_VENDOR_NAME: u8 = 0x00;
pub const OBJECT_PRODUCT_CODE: u8 = 0x01;
pub const OBJECT_MAJOR_MINOR_REVISION: u8 = 0x02;
pub const OBJECT_VENDOR_URL: u8 = 0x03;
pub const OBJECT_PRODUCT_NAME: u8 = 0x04;
pub const OBJECT_MODEL_NAME: u8 = 0x05;
pub const OBJECT_USER_APPLICATION_NAME: u8 = 0x06;

/// First vendor-specific object id.
pub const VENDOR_SPECIFIC_BASE: u8 = 0x80;

#[derive(Debug, Error)]
pub enum DeviceIdentityError {
    #[error("Vendor specific id {0:#04x} below 0x80")]
    InvalidVendorSpecificId(u8),

    #[error("Object {0:#04x} value is {1} bytes, max 255")]
    ValueTooLong(u8, usize),
}

/// Read-only source of device identification objects.
///
/// The codec only reads it during execute; shared concurrent reads need no
/// coordination on this side.
pub trait DeviceIdentity {
    fn get(&self, object_id: u8) -> Option<&[u8]>;
}

/// In-memory identity store owned by the device/application layer.
pub struct DeviceIdentityMap {
    objects: Vec<(u8, Vec<u8>)>,
}

impl DeviceIdentityMap {
    /// Create new builder for the identity store
    pub fn builder() -> DeviceIdentityBuilder {
        DeviceIdentityBuilder {
            objects: Vec::new(),
        }
    }
}

impl DeviceIdentity for DeviceIdentityMap {
    fn get(&self, object_id: u8) -> Option<&[u8]> {
        self.objects
            .iter()
            .find(|(id, _)| *id == object_id)
            .map(|(_, value)| value.as_slice())
    }
}

pub struct DeviceIdentityBuilder {
    objects: Vec<(u8, Vec<u8>)>,
}

impl DeviceIdentityBuilder {
    pub fn vendor_name(self, value: &str) -> Self {
        self.set(OBJECT_VENDOR_NAME, value.as_bytes())
    }

    pub fn product_code(self, value: &str) -> Self {
        self.set(OBJECT_PRODUCT_CODE, value.as_bytes())
    }

    pub fn major_minor_revision(self, value: &str) -> Self {
        self.set(OBJECT_MAJOR_MINOR_REVISION, value.as_bytes())
    }

    pub fn vendor_url(self, value: &str) -> Self {
        self.set(OBJECT_VENDOR_URL, value.as_bytes())
    }

    pub fn product_name(self, value: &str) -> Self {
        self.set(OBJECT_PRODUCT_NAME, value.as_bytes())
    }

    pub fn model_name(self, value: &str) -> Self {
        self.set(OBJECT_MODEL_NAME, value.as_bytes())
    }

    pub fn user_application_name(self, value: &str) -> Self {
        self.set(OBJECT_USER_APPLICATION_NAME, value.as_bytes())
    }

    /// Add a vendor-specific object. The id range is validated in build().
    pub fn vendor_specific(self, object_id: u8, value: &[u8]) -> Self {
        self.set(object_id, value)
    }

    fn set(mut self, object_id: u8, value: &[u8]) -> Self {
        match self.objects.iter_mut().find(|(id, _)| *id == object_id) {
            Some(entry) => entry.1 = value.to_vec(),
            None => self.objects.push((object_id, value.to_vec())),
        }
        self
    }

    pub fn build(self) -> Result<DeviceIdentityMap, DeviceIdentityError> {
        for (id, value) in &self.objects {
            // ids between the standard roster and 0x80 are reserved
            if *id > OBJECT_USER_APPLICATION_NAME && *id < VENDOR_SPECIFIC_BASE {
                return Err(DeviceIdentityError::InvalidVendorSpecificId(*id));
            }
            if value.len() > u8::MAX as usize {
                return Err(DeviceIdentityError::ValueTooLong(*id, value.len()));
            }
        }
        Ok(DeviceIdentityMap {
            objects: self.objects,
        })
    }
}
