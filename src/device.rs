/*!
    The device session: every conversation of the ethernet interface, plus the local object
    dictionary and the process data cycle.

    [Device] wraps a [Link] and adds the conversational patterns on top of the single-exchange
    primitive: segmented reads (files, the parameter full list), chunked writes (files), the
    one-shot SDO/state/firmware requests and the cyclic process data frame. It owns the local
    parameter store filled by [Device::load_parameters]; references handed out by
    [Device::find_parameter] are invalidated by the next [Device::clear_parameters] or
    [Device::load_parameters].

    Segmented transfers are a small explicit state machine per call: a conversation keeps one
    sequence id, appends the payload of every `FIRST`/`MIDDLE` segment and finishes on `LAST`
    (or on a plain `OK`, which the device also uses as a single complete frame). An `ERR`
    segment aborts the conversation. The file system and firmware operations are file reads
    with special request payloads (`fs-getlist`, `fs-remove=<name>`, firmware image names).

    The parameter full list record layout (a packed record per entry, name first) is the one
    observed with Integro firmware; it is device defined and should be cross-checked against a
    live capture when the firmware changes.
*/

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::UiConfig;
use crate::error::{EthernetError, EthernetResult};
use crate::frame::{Frame, MessageType, SegmentStatus, SqiReply};
use crate::link::Link;
use crate::mapping::{PdoMappingEntry, PdoMappings};
use crate::parameter::{ObjectFlags, Parameter};
use crate::data::{FromValue, Value};
use crate::objects;

/// default per-call deadlines of the interface operations
pub mod expiry {
    use std::time::Duration;

    /// state read and state control
    pub const STATE: Duration = Duration::from_millis(3000);
    /// file content read or write
    pub const FILE: Duration = Duration::from_millis(5000);
    /// file list and file removal
    pub const FILE_SYSTEM: Duration = Duration::from_millis(3000);
    /// firmware update trigger
    pub const FIRMWARE: Duration = Duration::from_millis(2000);
    /// single SDO read or write
    pub const SDO: Duration = Duration::from_millis(1000);
    /// parameter upload or download going through the local store
    pub const UPLOAD: Duration = Duration::from_millis(5000);
    /// one segment of the parameter full list
    pub const PARAMETER_LIST: Duration = Duration::from_millis(1000);
    /// complete dictionary load including values
    pub const PARAMETER_LOAD: Duration = Duration::from_millis(9000);
    /// one process data exchange
    pub const PROCESS_DATA: Duration = Duration::from_millis(1000);
}

/// communication state of the drive, single byte codes of the EtherCAT state machine
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceState {
    Init = 1,
    PreOperational = 2,
    Boot = 3,
    SafeOperational = 4,
    Operational = 8,
}

impl TryFrom<u8> for DeviceState {
    type Error = u8;
    fn try_from(code: u8) -> Result<Self, u8> {
        Ok(match code {
            1 => Self::Init,
            2 => Self::PreOperational,
            3 => Self::Boot,
            4 => Self::SafeOperational,
            8 => Self::Operational,
            _ => return Err(code),
        })
    }
}

/// firmware image a [Device::trigger_firmware_update] applies, previously sent with [Device::write_file]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FirmwareImage {
    /// the SoC firmware, `app_firmware.bin`
    App,
    /// the communication chip firmware, `com_firmware.bin`
    Com,
}

impl FirmwareImage {
    pub fn filename(self) -> &'static str {
        match self {
            Self::App => "app_firmware.bin",
            Self::Com => "com_firmware.bin",
        }
    }
}

/// the prefix a successful file removal reply starts with
const REMOVE_OK: &str = "OK";

/**
    session to one SOMANET Integro drive over its ethernet interface

    ## Note

    At most one exchange is in flight at any moment, concurrent callers are serialized by the
    session. Failed exchanges are never retried here: on [EthernetError::Timeout] or
    [EthernetError::Io] the session is broken and must go through [Device::disconnect] and
    [Device::connect] before further use, on [EthernetError::Device] with
    [SqiReply::Busy] the caller may simply retry at its own pace.
*/
pub struct Device {
    link: Link,
    parameters: HashMap<(u16, u8), Parameter>,
    mappings: PdoMappings,
}

impl Device {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            link: Link::new(endpoint),
            parameters: HashMap::new(),
            mappings: PdoMappings::default(),
        }
    }

    /// connect to the drive, `false` when the TCP connect fails
    pub async fn connect(&self) -> bool {
        self.link.connect().await
    }
    /// close the session, idempotent
    pub async fn disconnect(&self) {
        self.link.disconnect().await;
    }
    /// whether the socket is open, this does not probe reachability
    pub async fn is_connected(&self) -> bool {
        self.link.is_connected().await
    }

    // ---- state ----

    /// read the drive's current communication state
    pub async fn get_state(&self, expiry: Duration) -> EthernetResult<DeviceState> {
        let request = Frame::request(MessageType::StateRead, self.link.next_sequence(), Vec::new());
        let response = self.link.exchange(&request, expiry).await?;
        let code = *response.data.first()
            .ok_or(EthernetError::Protocol("state response carried no payload"))?;
        DeviceState::try_from(code)
            .map_err(|_| EthernetError::Protocol("device reported an unknown state"))
    }

    /// request a state change, `true` when the drive acknowledged it
    pub async fn set_state(&self, state: DeviceState, expiry: Duration) -> EthernetResult<bool> {
        let request = Frame::request(
            MessageType::StateControl,
            self.link.next_sequence(),
            vec![state as u8],
        );
        let response = self.link.exchange(&request, expiry).await?;
        Ok(response.segment_status() == Some(SegmentStatus::Ok)
            && response.sqi_status() == Some(SqiReply::Ack))
    }

    // ---- files and firmware ----

    /// read the content of a file stored on the drive
    pub async fn read_file(&self, filename: &str, expiry: Duration) -> EthernetResult<Vec<u8>> {
        self.transfer_in(MessageType::FileRead, filename.as_bytes(), expiry).await
    }

    /**
        read the names of the files stored on the drive

        The drive answers one file per line; `strip_size_suffix` removes the
        `", size: <bytes>"` annotation from each line.
    */
    pub async fn read_file_list(&self, strip_size_suffix: bool, expiry: Duration)
        -> EthernetResult<Vec<String>>
    {
        let content = self.transfer_in(MessageType::FileRead, b"fs-getlist", expiry).await?;
        let text = String::from_utf8_lossy(&content);
        Ok(text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(|line| {
                if strip_size_suffix {
                    strip_size(line)
                } else {
                    line
                }
                .to_owned()
            })
            .collect())
    }

    /// delete a file on the drive, `true` when the drive reports success
    pub async fn remove_file(&self, filename: &str, expiry: Duration) -> EthernetResult<bool> {
        let command = format!("fs-remove={}", filename);
        let reply = self.transfer_in(MessageType::FileRead, command.as_bytes(), expiry).await?;
        let text = String::from_utf8_lossy(&reply);
        if text.starts_with(REMOVE_OK) {
            Ok(true)
        } else {
            log::debug!("drive refused removing {}: {}", filename, text.trim_end());
            Ok(false)
        }
    }

    /**
        send a file to the drive in chunks

        The first segment carries the file name, the following ones up to
        [crate::frame::BUFFER_SIZE] bytes of content each. Every chunk must be acknowledged
        before the next is sent; an error segment aborts the transfer.
    */
    pub async fn write_file(&self, filename: &str, data: &[u8], expiry: Duration)
        -> EthernetResult<()>
    {
        let id = self.link.next_sequence();
        self.write_chunk(id, SegmentStatus::First, filename.as_bytes().to_vec(), expiry).await?;
        let mut chunks = data.chunks(crate::frame::BUFFER_SIZE).peekable();
        while let Some(chunk) = chunks.next() {
            let status = if chunks.peek().is_some() { SegmentStatus::Middle } else { SegmentStatus::Last };
            self.write_chunk(id, status, chunk.to_vec(), expiry).await?;
        }
        // empty files still need their closing segment
        if data.is_empty() {
            self.write_chunk(id, SegmentStatus::Last, Vec::new(), expiry).await?;
        }
        Ok(())
    }

    async fn write_chunk(&self, id: u16, status: SegmentStatus, data: Vec<u8>, expiry: Duration)
        -> EthernetResult<()>
    {
        let request = Frame::chunk(MessageType::FileWrite, id, status, data);
        let response = self.link.exchange(&request, expiry).await?;
        if response.id != id {
            return Err(EthernetError::Protocol("chunk acknowledgment for a foreign sequence id"));
        }
        match response.segment_status() {
            // the device either echoes the chunk status or acknowledges with a plain OK
            Some(SegmentStatus::Ok) => Ok(()),
            Some(echoed) if echoed == status => Ok(()),
            Some(SegmentStatus::Err) => Err(EthernetError::Protocol("device aborted the file write")),
            _ => Err(EthernetError::Protocol("unexpected status acknowledging a chunk")),
        }
    }

    /**
        ask the drive to apply a previously transferred firmware image

        Send `app_firmware.bin` or `com_firmware.bin` with [Device::write_file] first, then
        trigger the matching [FirmwareImage]. Returns whether the drive acknowledged.
    */
    pub async fn trigger_firmware_update(&self, image: FirmwareImage, expiry: Duration)
        -> EthernetResult<bool>
    {
        let request = Frame::request(
            MessageType::FirmwareUpdate,
            self.link.next_sequence(),
            image.filename().as_bytes().to_vec(),
        );
        let response = self.link.exchange(&request, expiry).await?;
        Ok(response.segment_status() == Some(SegmentStatus::Ok)
            && response.sqi_status() == Some(SqiReply::Ack))
    }

    // ---- object dictionary ----

    /**
        fetch the complete object dictionary from the drive

        With `read_values` each record additionally carries the entry's current raw value.
        The returned list is in device order; [Device::load_parameters] is the variant filling
        the local store.
    */
    pub async fn read_parameter_list(&self, read_values: bool, expiry: Duration)
        -> EthernetResult<Vec<Parameter>>
    {
        let content = self.transfer_in(MessageType::ParameterFullList, &[], expiry).await?;
        parse_parameter_records(&content, read_values)
    }

    /// fetch the dictionary and (re)fill the local store with it
    pub async fn load_parameters(&mut self, read_values: bool, expiry: Duration)
        -> EthernetResult<()>
    {
        let list = self.read_parameter_list(read_values, expiry).await?;
        self.parameters.clear();
        for parameter in list {
            // a duplicate identity replaces the previous record
            self.parameters.insert((parameter.index, parameter.subindex), parameter);
        }
        Ok(())
    }

    /// drop every entry of the local store, invalidating all handed out references
    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    /// the local store, keyed by `(index, subindex)`, iteration order unspecified
    pub fn parameters(&self) -> &HashMap<(u16, u8), Parameter> {
        &self.parameters
    }

    /// entry of the local store, [EthernetError::NotFound] when the dictionary has no such key
    pub fn find_parameter(&self, index: u16, subindex: u8) -> EthernetResult<&Parameter> {
        self.parameters.get(&(index, subindex))
            .ok_or(EthernetError::NotFound { index, subindex })
    }

    /// mutable variant of [Device::find_parameter]
    pub fn find_parameter_mut(&mut self, index: u16, subindex: u8) -> EthernetResult<&mut Parameter> {
        self.parameters.get_mut(&(index, subindex))
            .ok_or(EthernetError::NotFound { index, subindex })
    }

    /// dump the local store through the log facade, optionally in dictionary order
    pub fn log_parameters(&self, sorted: bool) {
        let mut entries: Vec<&Parameter> = self.parameters.values().collect();
        if sorted {
            entries.sort();
        }
        for parameter in entries {
            log::info!("{}", parameter);
        }
    }

    // ---- SDO access ----

    /// read one dictionary entry directly from the drive, returning its raw value bytes
    pub async fn read_sdo(&self, index: u16, subindex: u8, expiry: Duration)
        -> EthernetResult<Vec<u8>>
    {
        let mut payload = Vec::with_capacity(3);
        payload.extend_from_slice(&index.to_le_bytes());
        payload.push(subindex);
        let request = Frame::request(MessageType::SdoRead, self.link.next_sequence(), payload);
        let response = self.link.exchange(&request, expiry).await?;
        sqi_guard(&response)?;
        Ok(response.data)
    }

    /// write raw value bytes to one dictionary entry of the drive
    pub async fn write_sdo(&self, index: u16, subindex: u8, data: &[u8], expiry: Duration)
        -> EthernetResult<()>
    {
        let mut payload = Vec::with_capacity(3 + data.len());
        payload.extend_from_slice(&index.to_le_bytes());
        payload.push(subindex);
        payload.extend_from_slice(data);
        let request = Frame::request(MessageType::SdoWrite, self.link.next_sequence(), payload);
        let response = self.link.exchange(&request, expiry).await?;
        sqi_guard(&response)?;
        Ok(())
    }

    /**
        SDO-read one entry and refresh it in the local store

        The entry must already be known from [Device::load_parameters]. The returned reference
        is only valid until the next store mutation.
    */
    pub async fn upload(&mut self, index: u16, subindex: u8, expiry: Duration)
        -> EthernetResult<&Parameter>
    {
        let data = self.read_sdo(index, subindex, expiry).await?;
        if data.is_empty() {
            return Err(EthernetError::Protocol("SDO read returned an empty payload"));
        }
        let parameter = self.parameters.get_mut(&(index, subindex))
            .ok_or(EthernetError::NotFound { index, subindex })?;
        parameter.byte_length = data.len();
        parameter.data = data;
        Ok(&*parameter)
    }

    /// [Device::upload] and decode the refreshed entry as `T`
    pub async fn upload_value<T: FromValue>(&mut self, index: u16, subindex: u8, expiry: Duration)
        -> EthernetResult<T>
    {
        self.upload(index, subindex, expiry).await?.get()
    }

    /// SDO-write the stored value of one entry to the drive
    pub async fn download(&mut self, index: u16, subindex: u8, expiry: Duration)
        -> EthernetResult<()>
    {
        let parameter = self.find_parameter(index, subindex)?;
        if parameter.data.is_empty() {
            return Err(EthernetError::Client("the parameter holds no data to download"));
        }
        let data = parameter.data.clone();
        self.write_sdo(index, subindex, &data, expiry).await
    }

    /// store a new value for one entry and SDO-write it to the drive
    pub async fn download_value(
        &mut self,
        index: u16,
        subindex: u8,
        value: impl Into<Value>,
        expiry: Duration,
    ) -> EthernetResult<()> {
        let data = {
            let parameter = self.find_parameter_mut(index, subindex)?;
            parameter.set_value(value.into())?;
            parameter.data.clone()
        };
        if data.is_empty() {
            return Err(EthernetError::Client("the parameter holds no data to download"));
        }
        self.write_sdo(index, subindex, &data, expiry).await
    }

    // ---- process data ----

    /// the active PDO mappings
    pub fn mappings(&self) -> &PdoMappings {
        &self.mappings
    }

    /// install mappings built by hand or from [PdoMappings::from_config]
    pub fn set_mappings(&mut self, mappings: PdoMappings) {
        self.mappings = mappings;
    }

    /// install the mappings of a parsed UI configuration file
    pub fn configure_mappings(&mut self, config: &UiConfig) -> EthernetResult<()> {
        self.mappings = PdoMappings::from_config(config)?;
        Ok(())
    }

    /**
        read the PDO configuration the drive currently uses

        Walks the assignment lists (0x1c12 receive, 0x1c13 transmit) and each assigned PDO's
        mapping words over SDO, and installs the result as the active mappings.
    */
    pub async fn read_pdo_mapping(&mut self, expiry: Duration) -> EthernetResult<()> {
        let rx = self.read_pdo_direction(objects::receive_pdo_assign.index, expiry).await?;
        let tx = self.read_pdo_direction(objects::transmit_pdo_assign.index, expiry).await?;
        self.mappings = PdoMappings { rx, tx };
        Ok(())
    }

    async fn read_pdo_direction(&self, assign: u16, expiry: Duration)
        -> EthernetResult<Vec<PdoMappingEntry>>
    {
        let mut entries = Vec::new();
        let slots = self.read_sdo_byte(assign, 0, expiry).await?;
        for slot in 1 ..= slots {
            let raw = self.read_sdo(assign, slot, expiry).await?;
            if raw.len() < 2 {
                return Err(EthernetError::Protocol("PDO assignment entry shorter than 16 bits"));
            }
            let pdo_index = u16::from_le_bytes([raw[0], raw[1]]);
            let words = self.read_sdo_byte(pdo_index, 0, expiry).await?;
            for sub in 1 ..= words {
                let raw = self.read_sdo(pdo_index, sub, expiry).await?;
                if raw.len() < 4 {
                    return Err(EthernetError::Protocol("PDO mapping word shorter than 32 bits"));
                }
                let word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                entries.push(PdoMappingEntry::from_word(pdo_index, word));
            }
        }
        Ok(entries)
    }

    async fn read_sdo_byte(&self, index: u16, subindex: u8, expiry: Duration) -> EthernetResult<u8> {
        self.read_sdo(index, subindex, expiry).await?
            .first()
            .copied()
            .ok_or(EthernetError::Protocol("SDO read returned an empty payload"))
    }

    /**
        exchange one raw process data buffer

        Sends the packed receive-direction bytes and returns the transmit-direction bytes of
        the response. A non-OK status is logged and yields an empty buffer, it is not fatal to
        the session.
    */
    pub async fn send_and_receive_process_data(&self, data: Vec<u8>, expiry: Duration)
        -> EthernetResult<Vec<u8>>
    {
        let request = Frame::request(MessageType::PdoRxTx, self.link.next_sequence(), data);
        let response = self.link.exchange(&request, expiry).await?;
        if response.segment_status() != Some(SegmentStatus::Ok) {
            log::warn!("process data exchange answered with status {:#04x}", response.status);
            return Ok(Vec::new());
        }
        Ok(response.data)
    }

    /**
        one full process data cycle against the local store

        Packs the current data of every RxPDO mapped parameter, performs one exchange, and
        unpacks the response into every TxPDO mapped parameter. Every mapped parameter must
        exist in the store. A response shorter than the transmit layout updates parameters up
        to the boundary only, trailing unmapped bytes are dropped; both are logged.
    */
    pub async fn exchange_process_data(&mut self, expiry: Duration) -> EthernetResult<()> {
        let outputs = self.pack_outputs()?;
        let inputs = self.send_and_receive_process_data(outputs, expiry).await?;
        self.unpack_inputs(&inputs)
    }

    /// concatenate the mapped RxPDO parameters into the on-wire buffer
    fn pack_outputs(&self) -> EthernetResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.mappings.rx_packed_size());
        for entry in &self.mappings.rx {
            let parameter = self.find_parameter(entry.index, entry.subindex)?;
            let size = entry.byte_size();
            // the entry's slot is zero padded or truncated to its mapped size
            let mut slot = parameter.data.clone();
            slot.resize(size, 0);
            buffer.extend_from_slice(&slot);
        }
        Ok(buffer)
    }

    /// slice the received buffer along the TxPDO layout and assign the slices
    fn unpack_inputs(&mut self, data: &[u8]) -> EthernetResult<()> {
        let mut offset = 0;
        for entry in &self.mappings.tx {
            let size = entry.byte_size();
            if offset + size > data.len() {
                log::warn!(
                    "process data response too short: {} bytes for a {} byte layout, stopping at {:#010x}",
                    data.len(), self.mappings.tx_packed_size(), entry.word(),
                );
                return Ok(());
            }
            let parameter = self.parameters.get_mut(&(entry.index, entry.subindex))
                .ok_or(EthernetError::NotFound { index: entry.index, subindex: entry.subindex })?;
            parameter.data = data[offset .. offset + size].to_vec();
            parameter.byte_length = size;
            offset += size;
        }
        if offset < data.len() {
            log::warn!("{} unmapped trailing bytes in the process data response", data.len() - offset);
        }
        Ok(())
    }

    // ---- segmented reads ----

    /**
        the segmented read conversation shared by files and the parameter full list

        The initial request carries `request` as payload, follow-ups are empty and reuse the
        conversation's sequence id. Segment payloads accumulate until `LAST` (or a plain `OK`,
        which the device uses for single-frame answers).
    */
    async fn transfer_in(&self, ty: MessageType, request: &[u8], expiry: Duration)
        -> EthernetResult<Vec<u8>>
    {
        let id = self.link.next_sequence();
        let mut frame = Frame::request(ty, id, request.to_vec());
        let mut content = Vec::new();
        loop {
            let response = self.link.exchange(&frame, expiry).await?;
            match response.segment_status() {
                Some(SegmentStatus::Ok) | Some(SegmentStatus::Last) => {
                    content.extend_from_slice(&response.data);
                    return Ok(content);
                }
                Some(SegmentStatus::First) | Some(SegmentStatus::Middle) => {
                    content.extend_from_slice(&response.data);
                    frame = Frame::request(ty, id, Vec::new());
                }
                Some(SegmentStatus::Err) =>
                    return Err(EthernetError::Protocol("device aborted the transfer")),
                None =>
                    return Err(EthernetError::Protocol("unknown segmentation status in a transfer")),
            }
        }
    }
}

/// strip a trailing `", size: <digits>"` annotation from a file list line
fn strip_size(line: &str) -> &str {
    const MARKER: &str = ", size: ";
    if let Some(position) = line.rfind(MARKER) {
        let suffix = &line[position + MARKER.len() ..];
        if !suffix.is_empty() && suffix.bytes().all(|byte| byte.is_ascii_digit()) {
            return &line[.. position];
        }
    }
    line
}

/// fail on a device-reported SQI error, busy is surfaced for the caller to retry
fn sqi_guard(response: &Frame) -> EthernetResult<()> {
    match response.sqi_status() {
        Some(SqiReply::Busy) => Err(EthernetError::Device(SqiReply::Busy)),
        Some(SqiReply::Err) => Err(EthernetError::Device(SqiReply::Err)),
        _ => Ok(()),
    }
}

/**
    decode the accumulated parameter full list payload

    One packed record per entry: NUL terminated name, then little endian index (2), subindex
    (1), bit length (2), data type (2), object code (2), flags (2), access (2), followed by
    `ceil(bitLength / 8)` raw value bytes when values were requested.
*/
fn parse_parameter_records(content: &[u8], read_values: bool) -> EthernetResult<Vec<Parameter>> {
    const FIXED_PART: usize = 13;
    let mut parameters = Vec::new();
    let mut cursor = 0;
    while cursor < content.len() {
        let name_end = content[cursor ..].iter().position(|&byte| byte == 0)
            .ok_or(EthernetError::Protocol("unterminated name in a parameter record"))?;
        let name = String::from_utf8_lossy(&content[cursor .. cursor + name_end]).into_owned();
        cursor += name_end + 1;
        if content.len() - cursor < FIXED_PART {
            return Err(EthernetError::Protocol("truncated parameter record"));
        }
        let mut field = |width: usize| {
            let raw = &content[cursor .. cursor + width];
            cursor += width;
            match width {
                1 => u16::from(raw[0]),
                _ => u16::from_le_bytes([raw[0], raw[1]]),
            }
        };
        let index = field(2);
        let subindex = field(1) as u8;
        let bit_length = field(2);
        let data_type = field(2);
        let code = field(2);
        let flags = ObjectFlags(field(2));
        let access = ObjectFlags(field(2));
        let byte_length = (usize::from(bit_length) + 7) / 8;
        let data = if read_values {
            if content.len() - cursor < byte_length {
                return Err(EthernetError::Protocol("truncated value in a parameter record"));
            }
            let value = content[cursor .. cursor + byte_length].to_vec();
            cursor += byte_length;
            value
        } else {
            Vec::new()
        };
        parameters.push(Parameter {
            name,
            index,
            subindex,
            bit_length,
            byte_length,
            data_type,
            code,
            flags,
            access,
            data,
        });
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// build one wire record as the drive serializes it
    fn record(name: &str, index: u16, subindex: u8, bit_length: u16, data_type: u16, value: &[u8]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(name.as_bytes());
        raw.push(0);
        raw.extend_from_slice(&index.to_le_bytes());
        raw.push(subindex);
        raw.extend_from_slice(&bit_length.to_le_bytes());
        raw.extend_from_slice(&data_type.to_le_bytes());
        raw.extend_from_slice(&(0x0007u16).to_le_bytes());
        raw.extend_from_slice(&ObjectFlags::RXTXPDO_MAP.0.to_le_bytes());
        raw.extend_from_slice(&ObjectFlags::ALL_RDWR.0.to_le_bytes());
        raw.extend_from_slice(value);
        raw
    }

    #[test]
    fn record_walk_with_values() {
        let mut content = record("Controlword", 0x6040, 0, 16, 0x0006, &[0x0f, 0x00]);
        content.extend(record("Position actual value", 0x6064, 0, 32, 0x0004, &[0x10, 0x27, 0x00, 0x00]));
        let parameters = parse_parameter_records(&content, true).unwrap();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name, "Controlword");
        assert_eq!(parameters[0].byte_length, 2);
        assert_eq!(parameters[0].get::<u16>().unwrap(), 0x000f);
        assert_eq!(parameters[1].get::<i32>().unwrap(), 10_000);
    }

    #[test]
    fn record_walk_without_values() {
        let content = record("Controlword", 0x6040, 0, 16, 0x0006, &[]);
        let parameters = parse_parameter_records(&content, false).unwrap();
        assert_eq!(parameters[0].byte_length, 2);
        assert!(parameters[0].data.is_empty());
    }

    #[test]
    fn truncated_record_is_rejected() {
        let mut content = record("Controlword", 0x6040, 0, 16, 0x0006, &[0x0f, 0x00]);
        content.truncate(content.len() - 1);
        assert!(parse_parameter_records(&content, true).is_err());
        assert!(parse_parameter_records(b"no terminator", true).is_err());
    }

    #[test]
    fn size_suffix_stripping() {
        assert_eq!(strip_size("config.csv, size: 1024"), "config.csv");
        assert_eq!(strip_size("name with, size: inside, size: 7"), "name with, size: inside");
        assert_eq!(strip_size("plain.txt"), "plain.txt");
        // a non numeric suffix is part of the name
        assert_eq!(strip_size("odd, size: big"), "odd, size: big");
    }
}
