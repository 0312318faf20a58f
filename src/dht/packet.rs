use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::DhtError;
use super::node::{NodeDescriptor, NodeId};
use crate::constants::NODE_ID_LEN;

const KIND_QUERY: u8 = 0x00;
const KIND_RESPONSE: u8 = 0x01;
const KIND_ERROR: u8 = 0x02;

const OP_PING: u8 = 0x00;
const OP_FIND: u8 = 0x01;
const OP_STORE: u8 = 0x02;

const MODE_NODE: u8 = 0x00;
const MODE_VALUE: u8 = 0x01;

const FAMILY_V4: u8 = 0x04;
const FAMILY_V6: u8 = 0x06;

/// Whether a find operation targets nodes or stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    Node,
    Value,
}

impl FindMode {
    fn as_byte(self) -> u8 {
        match self {
            FindMode::Node => MODE_NODE,
            FindMode::Value => MODE_VALUE,
        }
    }
}

impl TryFrom<u8> for FindMode {
    type Error = DhtError;

    fn try_from(value: u8) -> Result<Self, DhtError> {
        match value {
            MODE_NODE => Ok(FindMode::Node),
            MODE_VALUE => Ok(FindMode::Value),
            other => Err(DhtError::UnknownFindMode(other)),
        }
    }
}

/// Payload of a query packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBody {
    Ping,
    Find { mode: FindMode, target: NodeId },
    Store { token: Bytes, key: NodeId, port: u16 },
}

/// Payload of a response packet, mirroring the query subtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Ping,
    FindNode { nodes: Vec<NodeDescriptor> },
    FindValue { token: Bytes, nodes: Vec<NodeDescriptor> },
    StoreAck,
}

/// An overlay DHT packet.
///
/// Every packet carries the transaction `tag` pairing responses with
/// queries and the 160-bit identifier of the node speaking.
///
/// The codec is pure: [`encode`](Packet::encode) is total on well-formed
/// packets and `decode(encode(p)) == p` for every one of them. Malformed
/// bytes produce exactly one [`DhtError`] and no partial state.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use tindex::{FindMode, NodeId, Packet, QueryBody};
///
/// let packet = Packet::Query {
///     tag: Bytes::from_static(b"aa"),
///     sender: NodeId([7; 20]),
///     body: QueryBody::Find {
///         mode: FindMode::Node,
///         target: NodeId([9; 20]),
///     },
/// };
///
/// let wire = packet.encode();
/// assert_eq!(Packet::decode(&wire).unwrap(), packet);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Query {
        tag: Bytes,
        sender: NodeId,
        body: QueryBody,
    },
    Response {
        tag: Bytes,
        responder: NodeId,
        body: ResponseBody,
    },
    Error {
        tag: Bytes,
        id: NodeId,
        code: u64,
        message: Bytes,
    },
}

impl Packet {
    /// The transaction tag, present in every variant.
    pub fn tag(&self) -> &Bytes {
        match self {
            Packet::Query { tag, .. } | Packet::Response { tag, .. } | Packet::Error { tag, .. } => {
                tag
            }
        }
    }

    /// The identifier of the node that sent the packet.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Packet::Query { sender, .. } => sender,
            Packet::Response { responder, .. } => responder,
            Packet::Error { id, .. } => id,
        }
    }

    /// Serializes the packet.
    ///
    /// # Panics
    ///
    /// Panics if a tag or token exceeds 255 bytes, an error message
    /// exceeds 65535 bytes, or a node list exceeds 65535 entries. Those
    /// limits are part of the wire format; exceeding them is a caller
    /// bug, not an encodable packet.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Packet::Query { tag, sender, body } => {
                buf.put_u8(KIND_QUERY);
                put_short_bytes(&mut buf, tag);
                buf.put_slice(sender.as_bytes());
                match body {
                    QueryBody::Ping => buf.put_u8(OP_PING),
                    QueryBody::Find { mode, target } => {
                        buf.put_u8(OP_FIND);
                        buf.put_u8(mode.as_byte());
                        buf.put_slice(target.as_bytes());
                    }
                    QueryBody::Store { token, key, port } => {
                        buf.put_u8(OP_STORE);
                        put_short_bytes(&mut buf, token);
                        buf.put_slice(key.as_bytes());
                        buf.put_u16(*port);
                    }
                }
            }
            Packet::Response {
                tag,
                responder,
                body,
            } => {
                buf.put_u8(KIND_RESPONSE);
                put_short_bytes(&mut buf, tag);
                buf.put_slice(responder.as_bytes());
                match body {
                    ResponseBody::Ping => buf.put_u8(OP_PING),
                    ResponseBody::FindNode { nodes } => {
                        buf.put_u8(OP_FIND);
                        buf.put_u8(MODE_NODE);
                        put_nodes(&mut buf, nodes);
                    }
                    ResponseBody::FindValue { token, nodes } => {
                        buf.put_u8(OP_FIND);
                        buf.put_u8(MODE_VALUE);
                        put_short_bytes(&mut buf, token);
                        put_nodes(&mut buf, nodes);
                    }
                    ResponseBody::StoreAck => buf.put_u8(OP_STORE),
                }
            }
            Packet::Error {
                tag,
                id,
                code,
                message,
            } => {
                buf.put_u8(KIND_ERROR);
                put_short_bytes(&mut buf, tag);
                buf.put_slice(id.as_bytes());
                put_varint(&mut buf, *code);
                assert!(message.len() <= u16::MAX as usize, "error message too long");
                buf.put_u16(message.len() as u16);
                buf.put_slice(message);
            }
        }

        buf.freeze()
    }

    /// Parses one packet, rejecting anything but an exact well-formed
    /// encoding.
    pub fn decode(data: &[u8]) -> Result<Self, DhtError> {
        let mut buf = data;
        let packet = Self::decode_one(&mut buf)?;
        if !buf.is_empty() {
            return Err(DhtError::TrailingBytes);
        }
        Ok(packet)
    }

    fn decode_one(buf: &mut &[u8]) -> Result<Self, DhtError> {
        let kind = get_u8(buf)?;
        let tag = get_short_bytes(buf)?;
        let id = get_node_id(buf)?;

        match kind {
            KIND_QUERY => {
                let body = match get_u8(buf)? {
                    OP_PING => QueryBody::Ping,
                    OP_FIND => QueryBody::Find {
                        mode: FindMode::try_from(get_u8(buf)?)?,
                        target: get_node_id(buf)?,
                    },
                    OP_STORE => {
                        let token = get_short_bytes(buf)?;
                        let key = get_node_id(buf)?;
                        let port = get_u16(buf)?;
                        QueryBody::Store { token, key, port }
                    }
                    other => return Err(DhtError::UnknownOp(other)),
                };
                Ok(Packet::Query {
                    tag,
                    sender: id,
                    body,
                })
            }
            KIND_RESPONSE => {
                let body = match get_u8(buf)? {
                    OP_PING => ResponseBody::Ping,
                    OP_FIND => match FindMode::try_from(get_u8(buf)?)? {
                        FindMode::Node => ResponseBody::FindNode {
                            nodes: get_nodes(buf)?,
                        },
                        FindMode::Value => {
                            let token = get_short_bytes(buf)?;
                            let nodes = get_nodes(buf)?;
                            ResponseBody::FindValue { token, nodes }
                        }
                    },
                    OP_STORE => ResponseBody::StoreAck,
                    other => return Err(DhtError::UnknownOp(other)),
                };
                Ok(Packet::Response {
                    tag,
                    responder: id,
                    body,
                })
            }
            KIND_ERROR => {
                let code = get_varint(buf)?;
                let len = get_u16(buf)? as usize;
                let message = take(buf, len)?;
                Ok(Packet::Error {
                    tag,
                    id,
                    code,
                    message,
                })
            }
            other => Err(DhtError::UnknownPacketKind(other)),
        }
    }
}

fn put_short_bytes(buf: &mut BytesMut, bytes: &Bytes) {
    assert!(bytes.len() <= u8::MAX as usize, "field too long for u8 length prefix");
    buf.put_u8(bytes.len() as u8);
    buf.put_slice(bytes);
}

fn put_nodes(buf: &mut BytesMut, nodes: &[NodeDescriptor]) {
    assert!(nodes.len() <= u16::MAX as usize, "node list too long");
    buf.put_u16(nodes.len() as u16);
    for node in nodes {
        buf.put_slice(node.id.as_bytes());
        match node.addr.ip() {
            IpAddr::V4(ip) => {
                buf.put_u8(FAMILY_V4);
                buf.put_slice(&ip.octets());
            }
            IpAddr::V6(ip) => {
                buf.put_u8(FAMILY_V6);
                buf.put_slice(&ip.octets());
            }
        }
        buf.put_u16(node.addr.port());
    }
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

fn get_u8(buf: &mut &[u8]) -> Result<u8, DhtError> {
    if buf.remaining() < 1 {
        return Err(DhtError::Truncated);
    }
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut &[u8]) -> Result<u16, DhtError> {
    if buf.remaining() < 2 {
        return Err(DhtError::Truncated);
    }
    Ok(buf.get_u16())
}

fn take(buf: &mut &[u8], len: usize) -> Result<Bytes, DhtError> {
    if buf.remaining() < len {
        return Err(DhtError::Truncated);
    }
    Ok(buf.copy_to_bytes(len))
}

fn get_short_bytes(buf: &mut &[u8]) -> Result<Bytes, DhtError> {
    let len = get_u8(buf)? as usize;
    take(buf, len)
}

fn get_node_id(buf: &mut &[u8]) -> Result<NodeId, DhtError> {
    if buf.remaining() < NODE_ID_LEN {
        return Err(DhtError::Truncated);
    }
    let mut id = [0u8; NODE_ID_LEN];
    buf.copy_to_slice(&mut id);
    Ok(NodeId(id))
}

fn get_nodes(buf: &mut &[u8]) -> Result<Vec<NodeDescriptor>, DhtError> {
    let count = get_u16(buf)? as usize;
    // Cheapest possible descriptor is id + family + v4 address + port.
    if buf.remaining() < count * (NODE_ID_LEN + 7) {
        return Err(DhtError::Truncated);
    }

    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        let id = get_node_id(buf)?;
        let ip = match get_u8(buf)? {
            FAMILY_V4 => {
                let mut octets = [0u8; 4];
                if buf.remaining() < 4 {
                    return Err(DhtError::Truncated);
                }
                buf.copy_to_slice(&mut octets);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            FAMILY_V6 => {
                let mut octets = [0u8; 16];
                if buf.remaining() < 16 {
                    return Err(DhtError::Truncated);
                }
                buf.copy_to_slice(&mut octets);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            other => return Err(DhtError::UnknownAddressFamily(other)),
        };
        let port = get_u16(buf)?;
        nodes.push(NodeDescriptor::new(id, SocketAddr::new(ip, port)));
    }
    Ok(nodes)
}

fn get_varint(buf: &mut &[u8]) -> Result<u64, DhtError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = get_u8(buf)?;
        if shift > 63 || (shift == 63 && (byte & 0x7F) > 1) {
            return Err(DhtError::IntegerOverflow);
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}
