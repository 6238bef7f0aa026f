/*!
    The wire framing of the SOMANET Integro ethernet interface.

    Every request and response travels as one frame: a 7 bytes header followed by up to
    [BUFFER_SIZE] payload bytes. All multi-byte header fields are little endian. Conversations
    larger than one frame are cut into segments, flagged in the header status byte
    (see [SegmentStatus]).

    The codec here is deliberately tolerant: unknown type, status or SQI codes are carried as
    raw bytes and never rejected, the conversation layer decides its own policy. The only frame
    per call discipline on the TCP stream is also the conversation layer's business, trailing
    bytes after one complete frame are ignored by [Frame::parse].
*/

use packed_struct::prelude::*;

use crate::error::{EthernetError, EthernetResult};

/// byte size of the frame header
pub const HEADER_SIZE: usize = 7;
/// maximal payload size of one frame, one ethernet MTU minus the header
pub const BUFFER_SIZE: usize = 1500 - HEADER_SIZE;

/// the possible message types, from the ethernet interface definition
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageType {
    /// read one object dictionary entry
    SdoRead = 0x01,
    /// write one object dictionary entry
    SdoWrite = 0x02,
    /// exchange one cyclic process data buffer
    PdoRxTx = 0x03,
    PdoControl = 0x04,
    PdoMap = 0x05,
    /// apply a previously transferred firmware image
    FirmwareUpdate = 0x0b,
    FileRead = 0x0c,
    FileWrite = 0x0d,
    StateControl = 0x0e,
    StateRead = 0x0f,
    /// fetch the complete object dictionary content
    ParameterFullList = 0x13,
    ServerInfo = 0x20,
}

impl MessageType {
    pub fn from_raw(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => Self::SdoRead,
            0x02 => Self::SdoWrite,
            0x03 => Self::PdoRxTx,
            0x04 => Self::PdoControl,
            0x05 => Self::PdoMap,
            0x0b => Self::FirmwareUpdate,
            0x0c => Self::FileRead,
            0x0d => Self::FileWrite,
            0x0e => Self::StateControl,
            0x0f => Self::StateRead,
            0x13 => Self::ParameterFullList,
            0x20 => Self::ServerInfo,
            _ => return None,
        })
    }
}

/// segmentation flag of one frame in a possibly multi-frame conversation
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SegmentStatus {
    /// single complete frame, also used by the device as a plain acknowledgment
    Ok = 0x00,
    /// first segment, more follow
    First = 0x80,
    /// intermediate segment
    Middle = 0xc0,
    /// final segment
    Last = 0x40,
    /// the device aborted the conversation
    Err = 0x28,
}

impl SegmentStatus {
    pub fn from_raw(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::Ok,
            0x80 => Self::First,
            0xc0 => Self::Middle,
            0x40 => Self::Last,
            0x28 => Self::Err,
            _ => return None,
        })
    }
}

/// result of the device-internal SQI transaction backing a response
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SqiReply {
    /// the SoC could not process the request yet, retry later
    Busy = 0x28,
    Ack = 0x58,
    Err = 0x63,
}

impl SqiReply {
    pub fn from_raw(code: u8) -> Option<Self> {
        Some(match code {
            0x28 => Self::Busy,
            0x58 => Self::Ack,
            0x63 => Self::Err,
            _ => return None,
        })
    }
}

/// frame header layout, all integers little endian
#[derive(PackedStruct, Copy, Clone, Debug, Eq, PartialEq)]
#[packed_struct(endian = "lsb")]
struct FrameHeader {
    ty: u8,
    id: u16,
    status: u8,
    sqi: u8,
    size: u16,
}

/**
    one frame of the ethernet interface, header fields plus payload

    The code fields are kept raw so that unknown values coming from the device survive a
    parse/serialize round trip, the typed views [Self::message_type], [Self::segment_status]
    and [Self::sqi_status] are provided for matching on the known codes.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// message type code, see [MessageType]
    pub ty: u8,
    /// sequence identifier, echoed by the device
    pub id: u16,
    /// segmentation status code, see [SegmentStatus]
    pub status: u8,
    /// SQI reply code, see [SqiReply], zero in requests
    pub sqi: u8,
    /// payload, at most [BUFFER_SIZE] bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// build a single-frame request with the given payload
    pub fn request(ty: MessageType, id: u16, data: Vec<u8>) -> Self {
        Self::chunk(ty, id, SegmentStatus::Ok, data)
    }
    /// build one segment of a multi-frame request
    pub fn chunk(ty: MessageType, id: u16, status: SegmentStatus, data: Vec<u8>) -> Self {
        Self {
            ty: ty as u8,
            id,
            status: status as u8,
            sqi: 0,
            data,
        }
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_raw(self.ty)
    }
    pub fn segment_status(&self) -> Option<SegmentStatus> {
        SegmentStatus::from_raw(self.status)
    }
    pub fn sqi_status(&self) -> Option<SqiReply> {
        SqiReply::from_raw(self.sqi)
    }

    /// serialize into exactly `7 + data.len()` bytes
    pub fn serialize(&self) -> EthernetResult<Vec<u8>> {
        if self.data.len() > BUFFER_SIZE {
            return Err(EthernetError::Client("frame payload exceeds the buffer size"));
        }
        let header = FrameHeader {
            ty: self.ty,
            id: self.id,
            status: self.status,
            sqi: self.sqi,
            size: self.data.len() as u16,
        };
        let mut raw = Vec::with_capacity(HEADER_SIZE + self.data.len());
        raw.extend_from_slice(&header.pack()?);
        raw.extend_from_slice(&self.data);
        Ok(raw)
    }

    /// parse one frame from the start of the buffer, trailing bytes are ignored
    pub fn parse(buffer: &[u8]) -> EthernetResult<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(EthernetError::ShortHeader { available: buffer.len() });
        }
        let mut raw = [0; HEADER_SIZE];
        raw.copy_from_slice(&buffer[.. HEADER_SIZE]);
        let header = FrameHeader::unpack(&raw)?;
        let size = usize::from(header.size);
        let payload = &buffer[HEADER_SIZE ..];
        if payload.len() < size {
            return Err(EthernetError::Truncated {
                announced: size,
                available: payload.len(),
            });
        }
        Ok(Self {
            ty: header.ty,
            id: header.id,
            status: header.status,
            sqi: header.sqi,
            data: payload[.. size].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_layout() {
        let frame = Frame {
            ty: MessageType::FileRead as u8,
            id: 0x1234,
            status: SegmentStatus::Ok as u8,
            sqi: SqiReply::Ack as u8,
            data: vec![0x61, 0x62, 0x63],
        };
        assert_eq!(
            frame.serialize().unwrap(),
            [0x0c, 0x34, 0x12, 0x00, 0x58, 0x03, 0x00, 0x61, 0x62, 0x63],
        );
    }

    #[test]
    fn parse_roundtrip() {
        let frame = Frame {
            ty: MessageType::FileRead as u8,
            id: 0x1234,
            status: SegmentStatus::Ok as u8,
            sqi: SqiReply::Ack as u8,
            data: vec![0x61, 0x62, 0x63],
        };
        let raw = frame.serialize().unwrap();
        assert_eq!(Frame::parse(&raw).unwrap(), frame);
    }

    #[test]
    fn parse_ignores_trailing_bytes() {
        let mut raw = Frame::request(MessageType::StateRead, 1, vec![0x08]).serialize().unwrap();
        raw.extend_from_slice(&[0xde, 0xad]);
        let frame = Frame::parse(&raw).unwrap();
        assert_eq!(frame.data, [0x08]);
    }

    #[test]
    fn parse_preserves_unknown_codes() {
        let raw = [0x7f, 0x01, 0x00, 0x55, 0x99, 0x00, 0x00];
        let frame = Frame::parse(&raw).unwrap();
        assert_eq!(frame.ty, 0x7f);
        assert_eq!(frame.status, 0x55);
        assert_eq!(frame.sqi, 0x99);
        assert_eq!(frame.message_type(), None);
        assert_eq!(frame.segment_status(), None);
        assert_eq!(frame.sqi_status(), None);
        assert_eq!(frame.serialize().unwrap(), raw);
    }

    #[test]
    fn parse_short_header() {
        assert!(matches!(
            Frame::parse(&[0x0c, 0x00, 0x00]),
            Err(EthernetError::ShortHeader { available: 3 }),
        ));
    }

    #[test]
    fn parse_truncated_payload() {
        let raw = [0x0c, 0x00, 0x00, 0x00, 0x58, 0x05, 0x00, 0x61, 0x62];
        assert!(matches!(
            Frame::parse(&raw),
            Err(EthernetError::Truncated { announced: 5, available: 2 }),
        ));
    }

    #[test]
    fn serialize_refuses_oversized_payload() {
        let frame = Frame::request(MessageType::FileWrite, 1, vec![0; BUFFER_SIZE + 1]);
        assert!(frame.serialize().is_err());
    }
}
