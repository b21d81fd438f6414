use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::identity::{
    DeviceIdentity, OBJECT_MAJOR_MINOR_REVISION, OBJECT_USER_APPLICATION_NAME,
    OBJECT_VENDOR_NAME, VENDOR_SPECIFIC_BASE,
};

/// Modbus function code carrying the encapsulated interface.
pub const MEI_FUNCTION_CODE: u8 = 0x2B;

/// MEI function code with the exception bit set.
pub const MEI_EXCEPTION_FUNCTION_CODE: u8 = MEI_FUNCTION_CODE | 0x80;

/// "Read Device Information" MEI sub-function code.
pub const MEI_SUB_FUNCTION: u8 = 0x0E;

/// Illegal data address exception code.
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal data value exception code.
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Conformity advertised by responses built here: basic, regular and
/// extended categories served, individual access allowed.
pub const CONFORMITY_FULL: u8 = 0x83;

const REQUEST_LEN: usize = 3;
const RESPONSE_HEADER_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum MeiCodecError {
    #[error("Request too short: {0} bytes, expected 3")]
    RequestTooShort(usize),

    #[error("Exception response too short: {0} bytes, expected 2")]
    ExceptionTooShort(usize),

    #[error("Response header too short: {0} bytes, expected 6")]
    HeaderTooShort(usize),

    #[error("Truncated object entry at index {0}")]
    TruncatedObject(usize),

    #[error("Object {id:#04x} declares {declared} value bytes, only {available} available")]
    TruncatedValue {
        id: u8,
        declared: usize,
        available: usize,
    },
}

/// Device information read categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadDeviceCode {
    Basic = 0x01,
    Regular = 0x02,
    Extended = 0x03,
    Individual = 0x04,
}

impl ReadDeviceCode {
    fn from_wire(value: i32) -> Option<Self> {
        match value {
            0x01 => Some(Self::Basic),
            0x02 => Some(Self::Regular),
            0x03 => Some(Self::Extended),
            0x04 => Some(Self::Individual),
            _ => None,
        }
    }
}

/// "Read Device Information" request PDU.
///
/// Fields are wider than the wire byte so out-of-range values stay
/// representable until `execute` answers them with an exception response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDeviceInfoRequest {
    pub read_code: i32,
    pub object_id: i32,
}

impl ReadDeviceInfoRequest {
    pub fn new(read_code: ReadDeviceCode, object_id: u8) -> Self {
        Self {
            read_code: read_code as i32,
            object_id: object_id as i32,
        }
    }

    /// Encode to the 3-byte wire layout.
    ///
    /// Purely structural: no range checks, out-of-range fields truncate to
    /// their low byte.
    pub fn encode(&self) -> Vec<u8> {
        vec![MEI_SUB_FUNCTION, self.read_code as u8, self.object_id as u8]
    }

    /// Decode the 3-byte wire layout. Semantic validation is deferred to
    /// `execute`.
    pub fn decode(data: &[u8]) -> Result<Self, MeiCodecError> {
        if data.len() < REQUEST_LEN {
            return Err(MeiCodecError::RequestTooShort(data.len()));
        }
        let request = Self {
            read_code: data[1] as i32,
            object_id: data[2] as i32,
        };
        trace!(
            "Request decoded: read_code={}, object_id={}",
            request.read_code, request.object_id
        );
        Ok(request)
    }

    /// Run the request against an identity store.
    ///
    /// A validation failure short-circuits before any lookup and comes back
    /// as an `ExceptionResponse` in the `Err` position so the caller can
    /// transmit it; semantic violations never surface as codec errors.
    pub fn execute(
        &self,
        identity: &dyn DeviceIdentity,
    ) -> Result<ReadDeviceInfoResponse, ExceptionResponse> {
        let Some(read_code) = ReadDeviceCode::from_wire(self.read_code) else {
            debug!("Rejecting read_code {}: outside 1..=4", self.read_code);
            return Err(ExceptionResponse::illegal_data_value());
        };
        let Ok(object_id) = u8::try_from(self.object_id) else {
            debug!("Rejecting object_id {}: outside 0..=255", self.object_id);
            return Err(ExceptionResponse::illegal_data_address());
        };

        let information = collect_information(read_code, object_id, identity);
        debug!(
            "Device info request served: read_code={:?}, {} objects",
            read_code,
            information.len()
        );
        Ok(ReadDeviceInfoResponse::new(read_code, information))
    }
}

impl fmt::Display for ReadDeviceInfoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReadDeviceInfoRequest({},{})",
            self.read_code, self.object_id
        )
    }
}

fn collect_information(
    read_code: ReadDeviceCode,
    object_id: u8,
    identity: &dyn DeviceIdentity,
) -> Vec<(u8, Vec<u8>)> {
    let (first, last) = match read_code {
        ReadDeviceCode::Basic => (OBJECT_VENDOR_NAME, OBJECT_MAJOR_MINOR_REVISION),
        ReadDeviceCode::Regular => (OBJECT_VENDOR_NAME, OBJECT_USER_APPLICATION_NAME),
        ReadDeviceCode::Extended => (VENDOR_SPECIFIC_BASE, u8::MAX),
        ReadDeviceCode::Individual => (object_id, object_id),
    };

    // object_id is the starting object within the category's range
    let mut information = Vec::new();
    for id in first.max(object_id)..=last {
        if let Some(value) = identity.get(id) {
            information.push((id, value.to_vec()));
        }
    }
    information
}

/// "Read Device Information" response PDU.
///
/// `information` keeps wire order; the object count byte is derived from its
/// length at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDeviceInfoResponse {
    pub read_code: u8,
    pub conformity: u8,
    pub more_follows: u8,
    pub next_object_id: u8,
    pub information: Vec<(u8, Vec<u8>)>,
}

impl ReadDeviceInfoResponse {
    pub fn new(read_code: ReadDeviceCode, information: Vec<(u8, Vec<u8>)>) -> Self {
        Self {
            read_code: read_code as u8,
            conformity: CONFORMITY_FULL,
            more_follows: 0x00,
            next_object_id: 0x00,
            information,
        }
    }

    /// Look up an object by id in the ordered list.
    pub fn object(&self, id: u8) -> Option<&[u8]> {
        self.information
            .iter()
            .find(|(object_id, _)| *object_id == id)
            .map(|(_, value)| value.as_slice())
    }

    pub fn encode(&self) -> Vec<u8> {
        let body_len: usize = self.information.iter().map(|(_, v)| 2 + v.len()).sum();
        let mut pdu = Vec::with_capacity(RESPONSE_HEADER_LEN + body_len);
        pdu.push(MEI_SUB_FUNCTION);
        pdu.push(self.read_code);
        pdu.push(self.conformity);
        pdu.push(self.more_follows);
        pdu.push(self.next_object_id);
        pdu.push(self.information.len() as u8);
        for (id, value) in &self.information {
            pdu.push(*id);
            pdu.push(value.len() as u8);
            pdu.extend_from_slice(value);
        }
        trace!(
            "Response encoded: {} objects, {} bytes",
            self.information.len(),
            pdu.len()
        );
        pdu
    }

    pub fn decode(data: &[u8]) -> Result<Self, MeiCodecError> {
        if data.len() < RESPONSE_HEADER_LEN {
            return Err(MeiCodecError::HeaderTooShort(data.len()));
        }

        let count = data[5] as usize;
        let mut information = Vec::with_capacity(count);
        let mut offset = RESPONSE_HEADER_LEN;
        for index in 0..count {
            if data.len() < offset + 2 {
                return Err(MeiCodecError::TruncatedObject(index));
            }
            let id = data[offset];
            let declared = data[offset + 1] as usize;
            offset += 2;
            if data.len() < offset + declared {
                return Err(MeiCodecError::TruncatedValue {
                    id,
                    declared,
                    available: data.len() - offset,
                });
            }
            information.push((id, data[offset..offset + declared].to_vec()));
            offset += declared;
        }

        debug!(
            "Response decoded: read_code={:#04x}, {} objects",
            data[1], count
        );
        Ok(Self {
            read_code: data[1],
            conformity: data[2],
            more_follows: data[3],
            next_object_id: data[4],
            information,
        })
    }
}

impl fmt::Display for ReadDeviceInfoResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReadDeviceInfoResponse({})", self.read_code)
    }
}

/// Protocol-level exception reply: `[0xAB, exception_code]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function_code: u8,
    pub exception_code: u8,
}

impl ExceptionResponse {
    pub fn new(exception_code: u8) -> Self {
        Self {
            function_code: MEI_EXCEPTION_FUNCTION_CODE,
            exception_code,
        }
    }

    pub fn illegal_data_value() -> Self {
        Self::new(EXCEPTION_ILLEGAL_DATA_VALUE)
    }

    pub fn illegal_data_address() -> Self {
        Self::new(EXCEPTION_ILLEGAL_DATA_ADDRESS)
    }

    pub fn encode(&self) -> Vec<u8> {
        vec![self.function_code, self.exception_code]
    }

    pub fn decode(data: &[u8]) -> Result<Self, MeiCodecError> {
        if data.len() < 2 {
            return Err(MeiCodecError::ExceptionTooShort(data.len()));
        }
        Ok(Self {
            function_code: data[0],
            exception_code: data[1],
        })
    }
}
