/*!
    somanet-ethernet is a crate driving a single SOMANET Integro drive over its TCP ethernet
    interface, with an API as close as possible to the concepts of the drive's object
    dictionary.

    The interface is a proprietary request/response protocol: every message is a 7 byte header
    plus payload, conversations larger than one frame are segmented through a status byte. On
    top of it the drive exposes CANopen/EtherCAT semantics, so this crate talks in those terms:
    SDO reads and writes, cyclic PDO buffers, the EtherCAT state machine, plus the drive's own
    file system and firmware services.

    ## It mainly features

    - [Device] for the full session: dictionary, process data, files, firmware, states
    - [Link] for the raw framing and the single bounded-time exchange primitive
    - [Parameter] and [Value] for typed access to dictionary entries

    ## Complete feature list

    - [x] wire framing
        + [x] header codec with tolerant handling of unknown codes
        + [x] segmented conversations (first/middle/last/error)
    - [x] object dictionary
        + [x] full dictionary fetch, with or without values
        + [x] SDO read/write, raw and typed
        + [x] typed value codec for the ETG.1020 scalar and string types
    - [x] process data
        + [x] mapping from the UI configuration JSON
        + [x] mapping read back from the device configuration
        + [x] cyclic exchange updating the local dictionary
    - [x] file system
        + [x] segmented file read and chunked file write
        + [x] file list and file removal
    - [x] firmware update trigger
    - [x] EtherCAT state read and control

    A session allows exactly one exchange in flight, concurrent callers are serialized; the
    device cannot multiplex anyway. Per-call deadlines bound every socket operation, an elapsed
    deadline breaks the session and requires a reconnect (see [device::expiry] for the
    defaults).
*/

pub mod data;
pub mod frame;
pub mod error;
pub mod parameter;
pub mod mapping;
pub mod config;
pub mod link;
pub mod device;
#[allow(non_upper_case_globals)]
pub mod objects;

pub use crate::config::UiConfig;
pub use crate::data::{FromValue, ObjectDataType, Value, ValueKind};
pub use crate::device::{Device, DeviceState, FirmwareImage};
pub use crate::error::{EthernetError, EthernetResult};
pub use crate::frame::{Frame, MessageType, SegmentStatus, SqiReply, BUFFER_SIZE, HEADER_SIZE};
pub use crate::link::Link;
pub use crate::mapping::{PdoMappingEntry, PdoMappings, PdoWord};
pub use crate::parameter::{ObjectCode, ObjectFlags, Parameter};
