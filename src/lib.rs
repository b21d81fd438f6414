// lib.rs

mod core;
mod identity;
mod modbus_rtu;

pub use core::{
    CONFORMITY_FULL, EXCEPTION_ILLEGAL_DATA_ADDRESS, EXCEPTION_ILLEGAL_DATA_VALUE,
    ExceptionResponse, MEI_EXCEPTION_FUNCTION_CODE, MEI_FUNCTION_CODE, MEI_SUB_FUNCTION,
    MeiCodecError, ReadDeviceCode, ReadDeviceInfoRequest, ReadDeviceInfoResponse,
};
pub use identity::{
    DeviceIdentity, DeviceIdentityBuilder, DeviceIdentityError, DeviceIdentityMap,
    OBJECT_MAJOR_MINOR_REVISION, OBJECT_MODEL_NAME, OBJECT_PRODUCT_CODE, OBJECT_PRODUCT_NAME,
    OBJECT_USER_APPLICATION_NAME, OBJECT_VENDOR_NAME, OBJECT_VENDOR_URL, VENDOR_SPECIFIC_BASE,
};
pub use modbus_rtu::{MeiRtu, rtu_frame_size};

#[derive(Debug, thiserror::Error)]
pub enum MeiTransportError {
    #[error("Frame too short")]
    FrameTooShort,

    #[error("Unit ID mismatch: expected {expected}, received {received}")]
    UnitIdMismatch { expected: u8, received: u8 },

    #[error("CRC mismatch: expected {expected:#06x}, received {received:#06x}")]
    CrcMismatch { expected: u16, received: u16 },

    #[error("Unexpected function code: {0:#04x}")]
    UnexpectedFunctionCode(u8),

    #[error("Modbus exception: function code {0:#x}, exception code {1:#x}")]
    Exception(u8, u8),

    #[error("Protocol error: {0}")]
    Protocol(#[from] MeiCodecError),
}
