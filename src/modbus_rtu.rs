use super::*;

use tracing::trace;

// addr + fc + sub-function + read code + conformity + more_follows +
// next_object_id + object count
const FRAME_OBJECTS_OFFSET: usize = 8;
const FRAME_OBJECT_COUNT_OFFSET: usize = 7;
const CRC_LEN: usize = 2;

/// Predict the total length of a device-information RTU response frame from
/// a partially received buffer, CRC trailer included.
///
/// Walks the fixed-offset object count and each object's length byte as far
/// as the buffer allows. `FrameTooShort` means a needed header byte has not
/// arrived yet; the transport reads more and calls again. No buffering
/// happens here.
pub fn rtu_frame_size(buffer: &[u8]) -> Result<usize, MeiTransportError> {
    if buffer.len() <= FRAME_OBJECT_COUNT_OFFSET {
        return Err(MeiTransportError::FrameTooShort);
    }

    let count = buffer[FRAME_OBJECT_COUNT_OFFSET] as usize;
    let mut size = FRAME_OBJECTS_OFFSET;
    for _ in 0..count {
        if buffer.len() < size + 2 {
            return Err(MeiTransportError::FrameTooShort);
        }
        size += 2 + buffer[size + 1] as usize;
    }

    trace!("RTU frame size resolved: {} bytes, {} objects", size + CRC_LEN, count);
    Ok(size + CRC_LEN)
}

/// RTU framing for MEI PDUs: device address and function code prefix, CRC-16
/// trailer around the encoded sub-function payload.
pub struct MeiRtu {
    device_id: u8,
}

impl MeiRtu {
    pub fn new(device_id: u8) -> Self {
        Self { device_id }
    }

    /// Generate complete RTU frame for a device information request
    pub fn frame_request(&self, request: &ReadDeviceInfoRequest) -> Vec<u8> {
        self.wrap(request.encode())
    }

    /// Generate complete RTU frame for a device information response
    pub fn frame_response(&self, response: &ReadDeviceInfoResponse) -> Vec<u8> {
        self.wrap(response.encode())
    }

    /// Generate complete RTU frame for an exception response
    pub fn frame_exception(&self, exception: &ExceptionResponse) -> Vec<u8> {
        let body = exception.encode();
        let mut frame = Vec::with_capacity(1 + body.len() + CRC_LEN);
        frame.push(self.device_id);
        frame.extend(&body);

        let crc = calculate_crc(&frame);
        frame.push(crc as u8);
        frame.push((crc >> 8) as u8);

        frame
    }

    /// Validate a complete frame and strip it down to the sub-function PDU.
    ///
    /// A received exception frame surfaces as a typed error carrying both
    /// bytes; decoding the PDU body stays with the codec.
    pub fn extract_pdu(&self, frame: &[u8]) -> Result<Vec<u8>, MeiTransportError> {
        if frame.len() < 5 {
            return Err(MeiTransportError::FrameTooShort);
        }

        let unit_id = frame[0];
        if unit_id != self.device_id {
            return Err(MeiTransportError::UnitIdMismatch {
                expected: self.device_id,
                received: unit_id,
            });
        }

        let received_crc = (frame[frame.len() - 1] as u16) << 8 | frame[frame.len() - 2] as u16;
        let calculated_crc = calculate_crc(&frame[..frame.len() - 2]);

        if received_crc != calculated_crc {
            return Err(MeiTransportError::CrcMismatch {
                expected: calculated_crc,
                received: received_crc,
            });
        }

        let function_code = frame[1];
        if function_code == MEI_EXCEPTION_FUNCTION_CODE {
            return Err(MeiTransportError::Exception(function_code, frame[2]));
        }
        if function_code != MEI_FUNCTION_CODE {
            return Err(MeiTransportError::UnexpectedFunctionCode(function_code));
        }

        Ok(frame[2..frame.len() - 2].to_vec())
    }

    fn wrap(&self, pdu: Vec<u8>) -> Vec<u8> {
        let mut frame = Vec::with_capacity(2 + pdu.len() + CRC_LEN);
        frame.push(self.device_id);
        frame.push(MEI_FUNCTION_CODE);
        frame.extend(&pdu);

        let crc = calculate_crc(&frame);
        frame.push(crc as u8);
        frame.push((crc >> 8) as u8);

        frame
    }
}

fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
